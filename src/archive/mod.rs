//! Workshop `.z` archive format
//!
//! Every asset of a workshop item is shipped as a `<name>.z` file which is
//! the original file split into fixed size chunks, each chunk compressed
//! with zlib on its own. Everything is stored in Little Endian format.
//!
//! # Header
//!
//! | Type    | Name              | Description |
//! | ------: | ----------------- | ----------- |
//! | [u8; 8] | signature         | Signature plus format version, `0x9E2A83C1` as a u64 |
//! | i64     | chunk size        | Uncompressed size of a full chunk |
//! | i64     | compressed size   | Sum of the compressed chunks, informational only |
//! | i64     | uncompressed size | Size of the original file |
//!
//! # Chunk Index
//!
//! Right after the header comes a list of `(compressed, uncompressed)` i64
//! pairs, one per chunk. There is no count, the reader keeps going until the
//! uncompressed sizes add up to the header's uncompressed size. Going over
//! means the archive is corrupt.
//!
//! | Type | Name              | Description |
//! | ---: | ----------------- | ----------- |
//! | i64  | compressed size   | Number of bytes of this chunk's zlib stream |
//! | i64  | uncompressed size | Number of bytes the zlib stream inflates to |
//!
//! Only the last chunk may be shorter (or longer) than the chunk size.
//!
//! # Chunk Data
//!
//! The zlib streams of every chunk back to back, in index order.
use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

pub mod builder;
pub mod reader;

pub use builder::{pack_file, ArchiveBuilder};
pub use reader::{unpack, unpack_file, ArchiveReader};

pub const SIGNATURE: u64 = 0x9E2A_83C1;

pub const HEADER_LEN: usize = 32;

/// Chunk size the game's own tooling uses
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchiveHeader {
    pub chunk_size: i64,
    pub compressed_total: i64,
    pub uncompressed_total: i64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkIndexEntry {
    pub compressed_size: i64,
    pub uncompressed_size: i64,
}

impl ArchiveHeader {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u64::<LittleEndian>(SIGNATURE)?;
        writer.write_i64::<LittleEndian>(self.chunk_size)?;
        writer.write_i64::<LittleEndian>(self.compressed_total)?;
        writer.write_i64::<LittleEndian>(self.uncompressed_total)
    }
}

impl ChunkIndexEntry {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_i64::<LittleEndian>(self.compressed_size)?;
        writer.write_i64::<LittleEndian>(self.uncompressed_size)
    }
}
