use std::io::Read;

/// Fill `buf` from `data` as far as the stream allows.
///
/// Returns `(eof, len)`, `eof` is set once the reader has nothing more to give.
pub fn fill_buf<R: Read>(data: &mut R, buf: &mut [u8]) -> std::io::Result<(bool, usize)> {
    let mut buf_read = 0;

    while buf_read < buf.len() {
        match data.read(&mut buf[buf_read..]) {
            Ok(0) => return Ok((true, buf_read)),
            Ok(x) => buf_read += x,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
    }
    Ok((false, buf_read))
}

/// Read exactly `len` bytes into a fresh vec.
///
/// The length comes from untrusted headers so the buffer grows with what the
/// stream actually delivers rather than being allocated up front.
pub fn read_vec<R: Read>(data: &mut R, len: u64) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    data.take(len).read_to_end(&mut buf)?;

    if (buf.len() as u64) < len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("wanted {} bytes, stream had {}", len, buf.len()),
        ));
    }
    Ok(buf)
}
