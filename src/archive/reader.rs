use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use flate2::read::ZlibDecoder;
use log::{debug, info};

use crate::archive::{ArchiveHeader, ChunkIndexEntry, SIGNATURE};
use crate::buf::read_vec;
use crate::error::{Corruption, Error, ReadContext};
use crate::output::write_atomic;

pub struct ArchiveReader<R: Read> {
    inner: R,
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        ArchiveReader { inner: reader }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    fn read_i64(&mut self, field: &'static str) -> Result<i64, Error> {
        self.inner.read_i64::<LittleEndian>().reading(|| field)
    }

    pub fn read_header(&mut self) -> Result<ArchiveHeader, Error> {
        let mut magic = [0u8; 8];
        self.inner
            .read_exact(&mut magic)
            .reading(|| "archive signature")?;

        // Bail before touching anything else
        let found = u64::from_le_bytes(magic);
        if found != SIGNATURE {
            return Err(Error::SignatureMismatch { found });
        }

        let header = ArchiveHeader {
            chunk_size: self.read_i64("chunk size")?,
            compressed_total: self.read_i64("compressed size")?,
            uncompressed_total: self.read_i64("uncompressed size")?,
        };

        if header.chunk_size < 0 {
            return Err(Corruption::NegativeSize {
                field: "chunk size",
                value: header.chunk_size,
            }
            .into());
        }
        if header.uncompressed_total < 0 {
            return Err(Corruption::NegativeSize {
                field: "uncompressed size",
                value: header.uncompressed_total,
            }
            .into());
        }

        debug!(
            "Header - chunk: {} packed: {} unpacked: {}",
            header.chunk_size, header.compressed_total, header.uncompressed_total
        );
        Ok(header)
    }

    pub fn read_index(&mut self, header: &ArchiveHeader) -> Result<Vec<ChunkIndexEntry>, Error> {
        let mut index = Vec::new();
        let mut indexed: i64 = 0;

        while indexed < header.uncompressed_total {
            let n = index.len() + 1;
            let compressed_size = self
                .inner
                .read_i64::<LittleEndian>()
                .reading(|| format!("index entry {}", n))?;
            let uncompressed_size = self
                .inner
                .read_i64::<LittleEndian>()
                .reading(|| format!("index entry {}", n))?;

            if compressed_size < 0 {
                return Err(Corruption::NegativeSize {
                    field: "compressed chunk size",
                    value: compressed_size,
                }
                .into());
            }
            if uncompressed_size < 0 {
                return Err(Corruption::NegativeSize {
                    field: "uncompressed chunk size",
                    value: uncompressed_size,
                }
                .into());
            }

            indexed = indexed.checked_add(uncompressed_size).ok_or(
                Corruption::HeaderIndexMismatch {
                    header: header.uncompressed_total,
                    index: i64::MAX,
                },
            )?;

            debug!(
                "{}: {}/{} ({}/{})",
                n, indexed, header.uncompressed_total, compressed_size, uncompressed_size
            );
            index.push(ChunkIndexEntry {
                compressed_size,
                uncompressed_size,
            });
        }

        if indexed != header.uncompressed_total {
            return Err(Corruption::HeaderIndexMismatch {
                header: header.uncompressed_total,
                index: indexed,
            }
            .into());
        }
        Ok(index)
    }

    fn read_chunk(
        &mut self,
        n: usize,
        count: usize,
        entry: &ChunkIndexEntry,
        chunk_size: i64,
    ) -> Result<Vec<u8>, Error> {
        let compressed = read_vec(&mut self.inner, entry.compressed_size as u64)
            .reading(|| format!("chunk {}/{} data", n, count))?;

        // One past the declared size is enough to notice an oversized chunk
        let mut data = Vec::new();
        ZlibDecoder::new(&compressed[..])
            .take(entry.uncompressed_size as u64 + 1)
            .read_to_end(&mut data)
            .map_err(|e| Corruption::MalformedChunk {
                chunk: n,
                message: e.to_string(),
            })?;

        let size = data.len() as u64;
        if size != entry.uncompressed_size as u64 {
            return Err(Corruption::ChunkSizeMismatch {
                chunk: n,
                expected: entry.uncompressed_size,
                actual: size,
            }
            .into());
        }

        if size != chunk_size as u64 && n != count {
            return Err(Corruption::MultiplePartialChunks {
                chunk: n,
                count,
                size,
                chunk_size,
            }
            .into());
        }
        Ok(data)
    }

    /// Validate and inflate the whole archive.
    ///
    /// Nothing is handed back unless every chunk checked out.
    pub fn decode(mut self) -> Result<Vec<u8>, Error> {
        let header = self.read_header()?;
        let index = self.read_index(&header)?;
        let count = index.len();

        let mut payload = Vec::new();
        for (i, entry) in index.iter().enumerate() {
            let chunk = self.read_chunk(i + 1, count, entry, header.chunk_size)?;
            payload.extend_from_slice(&chunk);
        }
        Ok(payload)
    }
}

pub fn unpack<R: Read>(reader: R) -> Result<Vec<u8>, Error> {
    ArchiveReader::new(reader).decode()
}

/// Unpack `src` into `dst`, `dst` only comes into existence once the whole
/// archive has been decoded.
pub fn unpack_file(src: &Path, dst: &Path) -> Result<u64, Error> {
    let file = File::open(src).map_err(|e| Error::MissingSource {
        path: src.to_path_buf(),
        source: e,
    })?;
    let data = unpack(BufReader::new(file))?;

    write_atomic(dst, &data)?;
    info!("Unpacked {} ({} bytes)", src.display(), data.len());

    Ok(data.len() as u64)
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    /// Hand assemble an archive, the declared sizes are taken as given so
    /// they can disagree with the data
    pub fn raw_archive(chunk_size: i64, total: i64, chunks: &[(&[u8], i64)]) -> Vec<u8> {
        let compressed: Vec<Vec<u8>> = chunks
            .iter()
            .map(|(data, _)| {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
                enc.write_all(data).unwrap();
                enc.finish().unwrap()
            })
            .collect();

        let mut out = Vec::new();
        ArchiveHeader {
            chunk_size,
            compressed_total: compressed.iter().map(|c| c.len() as i64).sum(),
            uncompressed_total: total,
        }
        .write_to(&mut out)
        .unwrap();

        for (c, (_, declared)) in compressed.iter().zip(chunks.iter()) {
            ChunkIndexEntry {
                compressed_size: c.len() as i64,
                uncompressed_size: *declared,
            }
            .write_to(&mut out)
            .unwrap();
        }
        for c in compressed.iter() {
            out.extend_from_slice(c);
        }
        out
    }
}
