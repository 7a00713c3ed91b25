use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::Error;

/// Replace `dst` with `data` in one step.
///
/// The bytes land in a temporary file next to `dst` which then gets renamed
/// over it, so readers see either the old file or the complete new one.
pub fn write_atomic(dst: &Path, data: &[u8]) -> Result<(), Error> {
    let dir = match dst.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(dst).map_err(|e| Error::IoFailure(e.error))?;

    Ok(())
}
