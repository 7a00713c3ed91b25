//! The `.mod` record read by the dedicated server
//!
//! | Type    | Name       | Description |
//! | ------: | ---------- | ----------- |
//! | i32     | mod id     | Workshop id of the item |
//! | [u8; 4] | padding    | Zeros |
//! | FString | mod name   | Always empty |
//! | FString | unknown    | Always empty |
//! | i32     | map count  | |
//! | FString | map name   | Repeated `map count` times |
//! | u32     | magic      | `4280483635` |
//! | i32     | version    | `2` |
//! | u8      | mod type   | ASCII `'1'` when the metadata holds a `ModType`, `'0'` otherwise |
//! | i32     | meta count | |
//! | FString | key        | Repeated `meta count` times, with its value |
//! | FString | value      | |
use std::io::Write;
use std::path::Path;

use byteorder::{LittleEndian, WriteBytesExt};
use log::info;

use crate::descriptor::MetaData;
use crate::error::Error;
use crate::output::write_atomic;
use crate::ue4::write_string;

pub const DESCRIPTOR_MAGIC: u32 = 4280483635;
pub const DESCRIPTOR_VERSION: i32 = 2;
pub const MOD_TYPE_KEY: &str = "ModType";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModDescriptor<'a> {
    pub mod_id: i32,
    pub map_names: &'a [String],
    pub meta_data: &'a MetaData,
}

impl<'a> ModDescriptor<'a> {
    pub fn new(mod_id: i32, map_names: &'a [String], meta_data: &'a MetaData) -> Self {
        ModDescriptor {
            mod_id,
            map_names,
            meta_data,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();

        out.write_i32::<LittleEndian>(self.mod_id)?;
        out.write_all(&[0; 4])?;
        write_string(&mut out, "")?;
        write_string(&mut out, "")?;

        out.write_i32::<LittleEndian>(count(self.map_names.len())?)?;
        for map in self.map_names.iter() {
            write_string(&mut out, map)?;
        }

        out.write_u32::<LittleEndian>(DESCRIPTOR_MAGIC)?;
        out.write_i32::<LittleEndian>(DESCRIPTOR_VERSION)?;
        out.write_u8(if self.meta_data.contains_key(MOD_TYPE_KEY) {
            b'1'
        } else {
            b'0'
        })?;

        out.write_i32::<LittleEndian>(count(self.meta_data.len())?)?;
        for (k, v) in self.meta_data.iter() {
            write_string(&mut out, k)?;
            write_string(&mut out, v)?;
        }

        Ok(out)
    }
}

fn count(len: usize) -> Result<i32, Error> {
    i32::try_from(len).map_err(|_| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("{} entries do not fit an i32 count", len),
        )
        .into()
    })
}

/// Compose the record in memory then hand it to `dest` in one write
pub fn write_descriptor<W: Write>(
    dest: &mut W,
    mod_id: i32,
    map_names: &[String],
    meta_data: &MetaData,
) -> Result<(), Error> {
    let record = ModDescriptor::new(mod_id, map_names, meta_data);
    dest.write_all(&record.to_bytes()?)?;
    dest.flush()?;
    Ok(())
}

pub fn write_descriptor_file(
    path: &Path,
    mod_id: i32,
    map_names: &[String],
    meta_data: &MetaData,
) -> Result<(), Error> {
    let record = ModDescriptor::new(mod_id, map_names, meta_data);
    write_atomic(path, &record.to_bytes()?)?;

    info!("Wrote {}", path.display());
    Ok(())
}
