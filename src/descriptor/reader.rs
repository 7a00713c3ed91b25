use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info};

use crate::descriptor::MetaData;
use crate::error::{Error, ReadContext};
use crate::ue4::read_string;

fn open(path: &Path) -> Result<BufReader<File>, Error> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::MissingSource {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Map names out of a `mod.info`, empty names are skipped
pub fn read_base_info<R: Read>(reader: &mut R) -> Result<Vec<String>, Error> {
    let _mod_name = read_string(reader)?;
    let map_count = reader
        .read_i32::<LittleEndian>()
        .reading(|| "map count")?;

    let mut map_names = Vec::new();
    for _ in 0..map_count.max(0) {
        let map = read_string(reader)?;
        if !map.is_empty() {
            debug!("map: {}", map);
            map_names.push(map);
        }
    }
    Ok(map_names)
}

/// Key/value pairs out of a `modmeta.info`.
///
/// Pairs missing either the key or the value are dropped, their bytes still
/// get consumed.
// TODO: confirm with a real `modmeta.info` whether a key with an empty value is meaningful
pub fn read_meta_data<R: Read>(reader: &mut R) -> Result<MetaData, Error> {
    let pair_count = reader
        .read_i32::<LittleEndian>()
        .reading(|| "pair count")?;

    let mut meta = MetaData::new();
    for _ in 0..pair_count.max(0) {
        let key = read_string(reader)?;
        let value = read_string(reader)?;

        if !key.is_empty() && !value.is_empty() {
            info!("{}: {}", key, value);
            meta.insert(key, value);
        } else {
            debug!("dropping pair <{:?}, {:?}>", key, value);
        }
    }
    Ok(meta)
}

pub fn read_base_info_file(path: &Path) -> Result<Vec<String>, Error> {
    read_base_info(&mut open(path)?)
}

pub fn read_meta_data_file(path: &Path) -> Result<MetaData, Error> {
    read_meta_data(&mut open(path)?)
}
