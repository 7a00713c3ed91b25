use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

pub const ARK_APP_ID: u32 = 346110;

const EXE_NAMES: [&str; 3] = ["steamcmd.exe", "steamcmd.sh", "steamcmd"];

#[derive(Debug)]
pub struct SteamCmd {
    exe: PathBuf,
    app_id: u32,
}

// Fixed install locations of hosting panels that ship their own client
#[cfg(windows)]
fn well_known() -> Vec<PathBuf> {
    vec![PathBuf::from(
        r"C:\Program Files\TCAdmin2\Monitor\Tools\SteamCmd\steamcmd.exe",
    )]
}

#[cfg(not(windows))]
fn well_known() -> Vec<PathBuf> {
    Vec::new()
}

fn find_exe(dir: &Path) -> Option<PathBuf> {
    EXE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

impl SteamCmd {
    pub fn new(exe: PathBuf, app_id: u32) -> Self {
        SteamCmd { exe, app_id }
    }

    /// Look for the client at the configured path (file or directory), then
    /// in the TCAdmin install on Windows, then under `<working_dir>/SteamCMD`.
    pub fn locate(configured: Option<&Path>, working_dir: &Path, app_id: u32) -> Option<Self> {
        let exe = match configured {
            Some(p) if p.is_file() => Some(p.to_path_buf()),
            Some(p) if p.is_dir() => find_exe(p),
            _ => None,
        }
        .or_else(|| well_known().into_iter().find(|p| p.is_file()))
        .or_else(|| find_exe(&working_dir.join("SteamCMD")))?;

        info!("Using SteamCMD at {}", exe.display());
        Some(SteamCmd::new(exe, app_id))
    }

    pub fn exe(&self) -> &Path {
        &self.exe
    }

    pub fn steamapps(&self) -> PathBuf {
        self.exe
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("steamapps")
    }

    pub fn content_dir(&self, mod_id: &str) -> PathBuf {
        self.steamapps()
            .join("workshop")
            .join("content")
            .join(self.app_id.to_string())
            .join(mod_id)
            .join("WindowsNoEditor")
    }

    /// Forget previous downloads, otherwise the client may decide an item is
    /// already up to date and skip it.
    pub fn clear_cache(&self) {
        let steamapps = self.steamapps();
        if !steamapps.is_dir() {
            return;
        }

        info!("Removing {}", steamapps.display());
        if let Err(e) = fs::remove_dir_all(&steamapps) {
            warn!("Failed to remove {}: {}", steamapps.display(), e);
            warn!("A shared SteamCMD cache may keep this item from downloading");
        }
    }

    pub fn download_args(&self, mod_id: &str) -> Vec<String> {
        vec![
            "+login".to_string(),
            "anonymous".to_string(),
            "+workshop_download_item".to_string(),
            self.app_id.to_string(),
            mod_id.to_string(),
            "+quit".to_string(),
        ]
    }

    // Exit status is only reported, whether the content showed up is what
    // decides if the install goes ahead
    pub fn download(&self, mod_id: &str) -> io::Result<()> {
        info!("Starting download of mod {}", mod_id);

        let status = Command::new(&self.exe)
            .args(self.download_args(mod_id))
            .status()?;

        if !status.success() {
            warn!("SteamCMD exited with {} for mod {}", status, mod_id);
        }
        Ok(())
    }
}
