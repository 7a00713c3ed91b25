use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("archive signature mismatch, found {found:#018x}")]
    SignatureMismatch { found: u64 },
    #[error("corrupt archive: {0}")]
    CorruptArchive(#[from] Corruption),
    #[error("stream ended while reading {context}")]
    TruncatedRead { context: String },
    #[error("invalid utf-8 in {context}")]
    InvalidString {
        context: String,
        #[source]
        source: FromUtf8Error,
    },
    #[error("unable to open {}", path.display())]
    MissingSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    IoFailure(#[from] io::Error),
}

// Chunk numbers are 1-based to match what gets logged
#[derive(Error, Debug, PartialEq)]
pub enum Corruption {
    #[error("header-index mismatch, header declares {header} bytes but the index holds {index}")]
    HeaderIndexMismatch { header: i64, index: i64 },
    #[error("chunk size mismatch in chunk {chunk}, decompressed {actual} bytes but the index declares {expected}")]
    ChunkSizeMismatch { chunk: usize, expected: i64, actual: u64 },
    #[error("multiple partial chunks, chunk {chunk}/{count} is {size} bytes but a full chunk is {chunk_size}")]
    MultiplePartialChunks {
        chunk: usize,
        count: usize,
        size: u64,
        chunk_size: i64,
    },
    #[error("malformed compressed data in chunk {chunk}: {message}")]
    MalformedChunk { chunk: usize, message: String },
    #[error("negative {field} ({value})")]
    NegativeSize { field: &'static str, value: i64 },
}

/// Tags an I/O result with the field being read, so that a short stream turns
/// into [`Error::TruncatedRead`] instead of a bare `UnexpectedEof`.
pub(crate) trait ReadContext<T> {
    fn reading<C, F>(self, context: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C;
}

impl<T> ReadContext<T> for io::Result<T> {
    fn reading<C, F>(self, context: F) -> Result<T, Error>
    where
        C: Into<String>,
        F: FnOnce() -> C,
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::TruncatedRead {
                context: context().into(),
            }),
            Err(e) => Err(Error::IoFailure(e)),
        }
    }
}
