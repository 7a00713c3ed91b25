use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use log::{debug, info, warn};

use crate::archive::unpack_file;
use crate::descriptor::{
    read_base_info_file, read_meta_data_file, write_descriptor_file, BASE_INFO_FILE,
    DESCRIPTOR_FILE, META_DATA_FILE,
};
use crate::error::Error;
use crate::output::write_atomic;
use crate::steamcmd::SteamCmd;

#[derive(thiserror::Error, Debug)]
pub enum InstallError {
    #[error(transparent)]
    Format(#[from] Error),
    #[error("{} does not contain an ARK server", .0.display())]
    NoServer(PathBuf),
    #[error("no downloaded content at {}", .0.display())]
    MissingContent(PathBuf),
    #[error("SteamCMD not found")]
    SteamCmdNotFound,
    #[error("invalid mod id {0:?}")]
    InvalidModId(String),
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
    #[error("{0}")]
    Usage(String),
    #[error("{failed} of {total} mods failed to install")]
    Incomplete { failed: usize, total: usize },
    #[error(transparent)]
    Walk(#[from] ignore::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub fn parse_mod_id(mod_id: &str) -> Result<i32, InstallError> {
    mod_id
        .trim()
        .parse::<i32>()
        .map_err(|_| InstallError::InvalidModId(mod_id.to_string()))
}

pub struct Server {
    root: PathBuf,
}

impl Server {
    pub fn open(root: &Path) -> Result<Self, InstallError> {
        if !root.join("ShooterGame").join("Content").is_dir() {
            return Err(InstallError::NoServer(root.to_path_buf()));
        }
        Ok(Server {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mods_dir(&self) -> PathBuf {
        self.root.join("ShooterGame").join("Content").join("Mods")
    }

    pub fn installed_mods(&self) -> Result<Vec<String>, InstallError> {
        installed_mods(&self.mods_dir())
    }
}

/// Names of the directories right under `mods_dir`
pub fn installed_mods(mods_dir: &Path) -> Result<Vec<String>, InstallError> {
    if !mods_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut mods = Vec::new();
    for entry in fs::read_dir(mods_dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            mods.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    mods.sort();
    Ok(mods)
}

fn walk(dir: &Path) -> ignore::Walk {
    WalkBuilder::new(dir)
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build()
}

fn sidecar(archive: &Path) -> PathBuf {
    let mut name = OsString::from(archive.as_os_str());
    name.push(".uncompressed_size");
    PathBuf::from(name)
}

/// Replace every `.z` archive under `dir` with its unpacked content.
///
/// Stops at the first archive that fails to decode.
pub fn extract_tree(dir: &Path) -> Result<usize, InstallError> {
    info!("Extracting .z files in {}", dir.display());

    // Collect first, the tree gets modified as we go
    let mut archives = Vec::new();
    for entry in walk(dir) {
        let entry = entry?;
        let is_file = entry.file_type().map(|ft| ft.is_file()).unwrap_or(false);
        if is_file && entry.path().extension().map_or(false, |ext| ext == "z") {
            archives.push(entry.into_path());
        }
    }

    for src in archives.iter() {
        let dst = src.with_extension("");
        unpack_file(src, &dst)?;
        fs::remove_file(src)?;

        let sidecar = sidecar(src);
        if sidecar.is_file() {
            fs::remove_file(&sidecar)?;
        }
        debug!("Extracted {}", dst.display());
    }
    Ok(archives.len())
}

/// Build `.mod` out of `mod.info` and `modmeta.info`, returns the map names
pub fn write_mod_file(content_dir: &Path, mod_id: i32) -> Result<Vec<String>, InstallError> {
    info!("Collecting mod details from {}", BASE_INFO_FILE);
    let map_names = read_base_info_file(&content_dir.join(BASE_INFO_FILE))?;

    info!("Collecting mod meta data from {}", META_DATA_FILE);
    let meta_data = read_meta_data_file(&content_dir.join(META_DATA_FILE))?;

    write_descriptor_file(
        &content_dir.join(DESCRIPTOR_FILE),
        mod_id,
        &map_names,
        &meta_data,
    )?;
    Ok(map_names)
}

pub fn copy_dir(src: &Path, dst: &Path) -> Result<(), InstallError> {
    for entry in walk(src) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        let target = dst.join(rel);

        match entry.file_type() {
            Some(ft) if ft.is_dir() => fs::create_dir_all(&target)?,
            Some(ft) if ft.is_file() => {
                fs::copy(entry.path(), &target)?;
            }
            _ => warn!("SKIP: {}", entry.path().display()),
        }
    }
    Ok(())
}

/// Replace `mods_dir/<mod_id>` with a copy of `content_dir`.
///
/// With `name_file` a `<primary map>.txt` holding the mod id is dropped into
/// `mods_dir` as well.
pub fn install_mod(
    content_dir: &Path,
    mods_dir: &Path,
    mod_id: &str,
    map_names: &[String],
    name_file: bool,
) -> Result<PathBuf, InstallError> {
    if !mods_dir.is_dir() {
        info!("Creating directory {}", mods_dir.display());
        fs::create_dir_all(mods_dir)?;
    }

    let output_dir = mods_dir.join(mod_id);

    // Stage next to the target so a failed copy leaves the old mod in place
    let staging = tempfile::Builder::new()
        .prefix(".arkmod-")
        .tempdir_in(mods_dir)?;
    copy_dir(content_dir, staging.path())?;

    if output_dir.is_dir() {
        fs::remove_dir_all(&output_dir)?;
    }
    info!("Moving mod files to {}", output_dir.display());
    fs::rename(staging.path(), &output_dir)?;

    if name_file {
        match map_names.first() {
            Some(map) => {
                let path = mods_dir.join(format!("{}.txt", map));
                info!("Creating mod name file {}", path.display());
                write_atomic(&path, mod_id.as_bytes())?;
            }
            None => warn!("Mod {} has no map name, skipping name file", mod_id),
        }
    }
    Ok(output_dir)
}

pub struct Installer {
    server: Server,
    steamcmd: SteamCmd,
    name_file: bool,
}

impl Installer {
    pub fn new(server: Server, steamcmd: SteamCmd, name_file: bool) -> Self {
        Installer {
            server,
            steamcmd,
            name_file,
        }
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Take an already downloaded item from the client's content folder into
    /// the server
    pub fn install_downloaded(&self, mod_id: &str) -> Result<PathBuf, InstallError> {
        let id = parse_mod_id(mod_id)?;
        let content_dir = self.steamcmd.content_dir(mod_id);
        if !content_dir.is_dir() {
            return Err(InstallError::MissingContent(content_dir));
        }

        extract_tree(&content_dir)?;
        let map_names = write_mod_file(&content_dir, id)?;
        install_mod(
            &content_dir,
            &self.server.mods_dir(),
            mod_id,
            &map_names,
            self.name_file,
        )
    }

    pub fn install(&self, mod_id: &str) -> Result<PathBuf, InstallError> {
        parse_mod_id(mod_id)?;
        self.steamcmd.download(mod_id)?;
        self.install_downloaded(mod_id)
    }
}

#[cfg(test)]
mod test_install {
    use super::*;
    use crate::archive::ArchiveBuilder;
    use crate::descriptor::MetaData;
    use crate::steamcmd::ARK_APP_ID;
    use crate::ue4::write_string;
    use byteorder::{LittleEndian, WriteBytesExt};
    use std::io::Cursor;

    fn pack(payload: &[u8]) -> Vec<u8> {
        let mut builder = ArchiveBuilder::new(Vec::new(), 32);
        builder.write(&mut Cursor::new(payload)).unwrap();
        builder.into_inner()
    }

    fn mod_info(maps: &[&str]) -> Vec<u8> {
        let mut data = Vec::new();
        write_string(&mut data, "SomeMod").unwrap();
        data.write_i32::<LittleEndian>(maps.len() as i32).unwrap();
        for m in maps {
            write_string(&mut data, m).unwrap();
        }
        data
    }

    fn mod_meta(pairs: &[(&str, &str)]) -> Vec<u8> {
        let mut data = Vec::new();
        data.write_i32::<LittleEndian>(pairs.len() as i32).unwrap();
        for (k, v) in pairs {
            write_string(&mut data, k).unwrap();
            write_string(&mut data, v).unwrap();
        }
        data
    }

    // A downloaded item: packed mod.info/modmeta.info plus one nested asset
    fn downloaded_item(content: &Path) -> Vec<u8> {
        let asset: Vec<u8> = (0..300u32).map(|i| (i % 7) as u8).collect();
        fs::create_dir_all(content.join("Maps")).unwrap();
        fs::write(content.join("mod.info.z"), pack(&mod_info(&["Valguero_P"]))).unwrap();
        fs::write(content.join("mod.info.z.uncompressed_size"), b"42").unwrap();
        fs::write(
            content.join("modmeta.info.z"),
            pack(&mod_meta(&[("ModType", "1"), ("Empty", "")])),
        )
        .unwrap();
        fs::write(content.join("Maps").join("Valguero_P.umap.z"), pack(&asset)).unwrap();
        asset
    }

    #[test]
    fn extract_nested() {
        let dir = tempfile::tempdir().unwrap();
        let asset = downloaded_item(dir.path());

        assert_eq!(extract_tree(dir.path()).unwrap(), 3);
        assert_eq!(
            fs::read(dir.path().join("Maps").join("Valguero_P.umap")).unwrap(),
            asset
        );
        assert!(!dir.path().join("mod.info.z").exists());
        assert!(!dir.path().join("mod.info.z.uncompressed_size").exists());
        assert!(dir.path().join("mod.info").is_file());
    }

    #[test]
    fn extract_corrupt_aborts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.uasset.z"), b"garbage that is not an archive").unwrap();

        assert!(matches!(
            extract_tree(dir.path()),
            Err(InstallError::Format(Error::SignatureMismatch { .. }))
        ));
        assert!(dir.path().join("a.uasset.z").exists());
        assert!(!dir.path().join("a.uasset").exists());
    }

    #[test]
    fn mod_file_from_content() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mod.info"), mod_info(&["Valguero_P", ""])).unwrap();
        fs::write(dir.path().join("modmeta.info"), mod_meta(&[("ModType", "1")])).unwrap();

        let maps = write_mod_file(dir.path(), 1234).unwrap();
        assert_eq!(maps, vec!["Valguero_P".to_string()]);

        let meta: MetaData = [("ModType", "1")].into_iter().collect();
        let expect = crate::descriptor::ModDescriptor::new(1234, &maps, &meta)
            .to_bytes()
            .unwrap();
        assert_eq!(fs::read(dir.path().join(".mod")).unwrap(), expect);
    }

    #[test]
    fn mod_file_missing_base_info() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("modmeta.info"), mod_meta(&[])).unwrap();

        assert!(matches!(
            write_mod_file(dir.path(), 1),
            Err(InstallError::Format(Error::MissingSource { .. }))
        ));
        assert!(!dir.path().join(".mod").exists());
    }

    #[test]
    fn mod_file_missing_meta_leaves_no_mod() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("mod.info"), mod_info(&["TheIsland"])).unwrap();

        assert!(write_mod_file(dir.path(), 1).is_err());
        assert!(!dir.path().join(".mod").exists());
    }

    #[test]
    fn install_replaces_existing() {
        let content = tempfile::tempdir().unwrap();
        let mods = tempfile::tempdir().unwrap();
        fs::create_dir_all(content.path().join("Maps")).unwrap();
        fs::write(content.path().join("Maps").join("a.umap"), b"new").unwrap();
        fs::create_dir_all(mods.path().join("42")).unwrap();
        fs::write(mods.path().join("42").join("stale"), b"old").unwrap();

        let out = install_mod(
            content.path(),
            mods.path(),
            "42",
            &["Island".to_string()],
            true,
        )
        .unwrap();

        assert_eq!(out, mods.path().join("42"));
        assert!(!out.join("stale").exists());
        assert_eq!(fs::read(out.join("Maps").join("a.umap")).unwrap(), b"new");
        assert_eq!(fs::read(mods.path().join("Island.txt")).unwrap(), b"42");
        assert_eq!(installed_mods(mods.path()).unwrap(), vec!["42".to_string()]);
    }

    #[test]
    fn failed_copy_keeps_old_mod() {
        let mods = tempfile::tempdir().unwrap();
        fs::create_dir_all(mods.path().join("42")).unwrap();
        fs::write(mods.path().join("42").join("a.umap"), b"old").unwrap();

        let missing = mods.path().join("no-such-download");
        assert!(install_mod(&missing, mods.path(), "42", &[], false).is_err());

        assert_eq!(fs::read(mods.path().join("42").join("a.umap")).unwrap(), b"old");
        assert_eq!(installed_mods(mods.path()).unwrap(), vec!["42".to_string()]);
    }

    #[test]
    fn server_layout() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Server::open(dir.path()),
            Err(InstallError::NoServer(_))
        ));

        fs::create_dir_all(dir.path().join("ShooterGame").join("Content")).unwrap();
        let server = Server::open(dir.path()).unwrap();
        assert!(server.installed_mods().unwrap().is_empty());
        assert_eq!(
            server.mods_dir(),
            dir.path().join("ShooterGame").join("Content").join("Mods")
        );
    }

    #[test]
    fn full_install_from_download() {
        let server_dir = tempfile::tempdir().unwrap();
        let steam_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(server_dir.path().join("ShooterGame").join("Content")).unwrap();

        let steamcmd = SteamCmd::new(steam_dir.path().join("steamcmd.sh"), ARK_APP_ID);
        let content = steamcmd.content_dir("555");
        let asset = downloaded_item(&content);

        let installer = Installer::new(Server::open(server_dir.path()).unwrap(), steamcmd, false);
        let out = installer.install_downloaded("555").unwrap();

        assert_eq!(fs::read(out.join("Maps").join("Valguero_P.umap")).unwrap(), asset);
        let descriptor = fs::read(out.join(".mod")).unwrap();
        assert_eq!(&descriptor[..4], &555i32.to_le_bytes());
        assert_eq!(
            installer.server().installed_mods().unwrap(),
            vec!["555".to_string()]
        );
    }

    #[test]
    fn missing_download() {
        let server_dir = tempfile::tempdir().unwrap();
        let steam_dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(server_dir.path().join("ShooterGame").join("Content")).unwrap();

        let steamcmd = SteamCmd::new(steam_dir.path().join("steamcmd.sh"), ARK_APP_ID);
        let installer = Installer::new(Server::open(server_dir.path()).unwrap(), steamcmd, false);

        assert!(matches!(
            installer.install_downloaded("555"),
            Err(InstallError::MissingContent(_))
        ));
    }

    #[test]
    fn mod_ids() {
        assert_eq!(parse_mod_id("731604991").unwrap(), 731604991);
        assert!(matches!(
            parse_mod_id("abc"),
            Err(InstallError::InvalidModId(_))
        ));
    }
}
