#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The checksum carried by a frame does not match the sum of its bytes.
    #[error("checksum mismatch: expected {expected:#06x}, actual {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    /// Fewer payload bytes were available than a frame requires.
    #[error("truncated frame: got {actual} bytes, expected {expected}")]
    TruncatedFrame { actual: usize, expected: usize },

    /// The byte source reached end of stream.
    #[error("stream closed")]
    StreamClosed,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl Error {
    /// Frame level errors the stream recovers from by resynchronizing.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::ChecksumMismatch { .. } | Error::TruncatedFrame { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
