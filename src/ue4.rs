//! Unreal Engine 4 `FString` serialization
//!
//! | Type    | Name   | Description |
//! | ------: | ------ | ----------- |
//! | i32     | length | Byte count of `value` including the trailing null |
//! | [u8; N] | value  | UTF-8 bytes followed by a `0x00`, absent when `length <= 0` |
//!
//! A negative length marks a UTF-16 string in the engine. Those never showed
//! up in workshop metadata so they are read back as an empty string, only the
//! length field is consumed.
use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::buf::read_vec;
use crate::error::{Error, ReadContext};

pub fn read_string<R: Read>(reader: &mut R) -> Result<String, Error> {
    let len = reader
        .read_i32::<LittleEndian>()
        .reading(|| "string length")?;

    if len <= 0 {
        return Ok(String::new());
    }

    let mut raw = read_vec(reader, len as u64).reading(|| format!("string of {} bytes", len))?;

    // Null terminator, taken on faith
    raw.pop();

    String::from_utf8(raw).map_err(|e| Error::InvalidString {
        context: format!("string of {} bytes", len),
        source: e,
    })
}

pub fn write_string<W: Write>(writer: &mut W, value: &str) -> io::Result<()> {
    let len = i32::try_from(value.len() + 1).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("string of {} bytes does not fit an i32 length", value.len()),
        )
    })?;

    writer.write_i32::<LittleEndian>(len)?;
    writer.write_all(value.as_bytes())?;
    writer.write_u8(0)
}
