use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use log::{debug, info};

use crate::archive::{ArchiveHeader, ChunkIndexEntry};
use crate::buf::fill_buf;
use crate::error::Error;
use crate::output::write_atomic;

pub struct ArchiveBuilder<W: Write> {
    inner: W,
    chunk_size: usize,
}

impl<W: Write> ArchiveBuilder<W> {
    pub fn new(writer: W, chunk_size: usize) -> Self {
        ArchiveBuilder {
            inner: writer,
            chunk_size,
        }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    // The header needs the totals up front so the chunks are compressed into
    // memory first and written out after the index
    pub fn write<R: Read>(&mut self, reader: &mut R) -> Result<ArchiveHeader, Error> {
        if self.chunk_size == 0 {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "chunk size of zero").into());
        }

        let mut chunks: Vec<(Vec<u8>, usize)> = Vec::new();
        let mut in_buf = vec![0u8; self.chunk_size];

        loop {
            let (eof, len) = fill_buf(reader, &mut in_buf)?;
            if len > 0 {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(&in_buf[..len])?;
                let compressed = enc.finish()?;

                debug!("chunk {}: {}/{}", chunks.len() + 1, compressed.len(), len);
                chunks.push((compressed, len));
            }
            if eof {
                break;
            }
        }

        let header = ArchiveHeader {
            chunk_size: self.chunk_size as i64,
            compressed_total: chunks.iter().map(|(c, _)| c.len() as i64).sum(),
            uncompressed_total: chunks.iter().map(|(_, len)| *len as i64).sum(),
        };

        header.write_to(&mut self.inner)?;
        for (compressed, len) in chunks.iter() {
            ChunkIndexEntry {
                compressed_size: compressed.len() as i64,
                uncompressed_size: *len as i64,
            }
            .write_to(&mut self.inner)?;
        }
        for (compressed, _) in chunks.iter() {
            self.inner.write_all(compressed)?;
        }
        self.inner.flush()?;

        Ok(header)
    }
}

pub fn pack_file(src: &Path, dst: &Path, chunk_size: usize) -> Result<ArchiveHeader, Error> {
    let file = File::open(src).map_err(|e| Error::MissingSource {
        path: src.to_path_buf(),
        source: e,
    })?;

    let mut builder = ArchiveBuilder::new(Vec::new(), chunk_size);
    let header = builder.write(&mut BufReader::new(file))?;
    write_atomic(dst, &builder.into_inner())?;

    info!(
        "Packed {} ({} -> {} bytes)",
        src.display(),
        header.uncompressed_total,
        header.compressed_total
    );
    Ok(header)
}
