use std::io::{self, Read, Write};

use thiserror::Error;

/// Largest frame accepted from a peer.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Framing errors.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("frame of {0} bytes exceeds the limit of {max} bytes", max = MAX_FRAME_LEN)]
    TooLarge(usize),
}

/// Write a length-prefixed frame to `stream`.
/// The length is a big-endian u32 followed by the raw bytes.
pub fn write_frame<W: Write>(stream: &mut W, data: &[u8]) -> Result<(), FrameError> {
    if data.len() > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(data.len()));
    }
    let len_bytes = (data.len() as u32).to_be_bytes();
    stream.write_all(&len_bytes)?;
    stream.write_all(data)?;
    stream.flush()?;
    Ok(())
}

/// Read a length-prefixed frame from `stream`.
pub fn read_frame<R: Read>(stream: &mut R) -> Result<Vec<u8>, FrameError> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let frame_len = u32::from_be_bytes(len_buf) as usize;
    if frame_len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(frame_len));
    }
    let mut buffer = vec![0u8; frame_len];
    stream.read_exact(&mut buffer)?;
    Ok(buffer)
}
