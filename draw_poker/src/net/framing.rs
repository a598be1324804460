//! Frame boundaries on raw byte streams.
//!
//! Stream transports carry one encoded message per frame, either behind a
//! little-endian `u32` length prefix or terminated by a NUL byte. Message
//! text is JSON and never contains NUL.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum allowed frame size (64KiB). A full reveal for five players is a
/// couple of KiB.
pub const MAX_FRAME_SIZE: usize = 64 * 1024;

/// Bytes requested per read while hunting for a NUL terminator.
const READ_CHUNK: usize = 1024;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Framing {
    LengthPrefixed,
    #[default]
    NulTerminated,
}

impl std::str::FromStr for Framing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prefixed" | "length-prefixed" => Ok(Self::LengthPrefixed),
            "nul" | "nul-terminated" => Ok(Self::NulTerminated),
            other => Err(format!("unknown framing '{other}'")),
        }
    }
}

impl std::fmt::Display for Framing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthPrefixed => write!(f, "length-prefixed"),
            Self::NulTerminated => write!(f, "nul-terminated"),
        }
    }
}

fn too_large(len: usize, max: usize) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("frame size {len} exceeds maximum allowed size of {max} bytes"),
    )
}

/// Reads whole frames off a byte stream.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    framing: Framing,
    max_frame_size: usize,
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, framing: Framing, max_frame_size: usize) -> Self {
        Self {
            reader,
            framing,
            max_frame_size,
            pending: Vec::new(),
        }
    }

    /// Next frame payload, or `None` if the stream ended cleanly between
    /// frames. Ending mid-frame is an `UnexpectedEof` error.
    pub async fn read_frame(&mut self) -> io::Result<Option<Vec<u8>>> {
        match self.framing {
            Framing::LengthPrefixed => self.read_prefixed().await,
            Framing::NulTerminated => self.read_terminated().await,
        }
    }

    async fn read_prefixed(&mut self) -> io::Result<Option<Vec<u8>>> {
        let mut len_bytes = [0; 4];
        let mut filled = 0;
        while filled < len_bytes.len() {
            let n = self.reader.read(&mut len_bytes[filled..]).await?;
            if n == 0 {
                if filled == 0 {
                    return Ok(None);
                }
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            filled += n;
        }

        let len = u32::from_le_bytes(len_bytes) as usize;
        if len > self.max_frame_size {
            return Err(too_large(len, self.max_frame_size));
        }

        let mut buf = vec![0; len];
        self.reader.read_exact(&mut buf).await?;
        Ok(Some(buf))
    }

    async fn read_terminated(&mut self) -> io::Result<Option<Vec<u8>>> {
        loop {
            if let Some(end) = self.pending.iter().position(|&b| b == 0) {
                if end > self.max_frame_size {
                    return Err(too_large(end, self.max_frame_size));
                }
                let mut frame: Vec<u8> = self.pending.drain(..=end).collect();
                frame.pop();
                return Ok(Some(frame));
            }
            // A frame of exactly the limit may still be waiting on its NUL.
            if self.pending.len() > self.max_frame_size {
                return Err(too_large(self.pending.len(), self.max_frame_size));
            }

            let mut chunk = [0; READ_CHUNK];
            let n = self.reader.read(&mut chunk).await?;
            if n == 0 {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Err(io::ErrorKind::UnexpectedEof.into());
            }
            self.pending.extend_from_slice(&chunk[..n]);
        }
    }
}

/// Write one frame. The frame goes out in a single `write_all` so a reader
/// never sees a header without its payload.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    framing: Framing,
    max_frame_size: usize,
    payload: &[u8],
) -> io::Result<()> {
    if payload.len() > max_frame_size {
        return Err(too_large(payload.len(), max_frame_size));
    }

    let mut buf = Vec::with_capacity(payload.len() + 4);
    match framing {
        Framing::LengthPrefixed => {
            let size = payload.len() as u32;
            buf.extend(size.to_le_bytes());
            buf.extend_from_slice(payload);
        }
        Framing::NulTerminated => {
            if payload.contains(&0) {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "payload contains a NUL byte",
                ));
            }
            buf.extend_from_slice(payload);
            buf.push(0);
        }
    }
    writer.write_all(&buf).await?;
    writer.flush().await
}
