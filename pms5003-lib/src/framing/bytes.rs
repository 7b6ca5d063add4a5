use std::io::{self, ErrorKind};
use std::thread;
use std::time::Duration;

use crate::{Error, Result};

/// Bytes provides the ability to read bytes from a reader and push them
/// back if they are not needed, i.e., Peek-and-push. The original order of
/// the bytes is preserved when pushing bytes back.
///
/// Read timeouts are treated as "no data yet". While reading single bytes they are
/// retried, after a short sleep for non-blocking readers. While filling a buffer
/// they end the fill with [Error::TruncatedFrame].
pub(crate) struct Bytes<R>
where
    R: io::Read + Send,
{
    reader: R,
    num_read: usize,
    cache: Vec<u8>,
    buf: [u8; 1],
}

/// Wait before reading again from a non-blocking reader that has no data.
const WOULD_BLOCK_BACKOFF: Duration = Duration::from_millis(10);

fn is_pause(err: &io::Error) -> bool {
    matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

impl<R> Bytes<R>
where
    R: io::Read + Send,
{
    pub fn new(reader: R) -> Self {
        Bytes {
            reader,
            num_read: 0,
            cache: Vec::new(),
            buf: [0u8; 1],
        }
    }

    /// Next byte, blocking until one is available.
    ///
    /// # Errors
    /// [Error::StreamClosed] at EOF, [Error::Io] on any other read failure.
    pub fn next(&mut self) -> Result<u8> {
        if let Some(b) = self.cache.pop() {
            return Ok(b);
        }
        loop {
            match self.reader.read(&mut self.buf) {
                Ok(0) => return Err(Error::StreamClosed),
                Ok(_) => {
                    self.num_read += 1;
                    return Ok(self.buf[0]);
                }
                Err(err) if err.kind() == ErrorKind::WouldBlock => {
                    thread::sleep(WOULD_BLOCK_BACKOFF);
                }
                Err(err) if matches!(err.kind(), ErrorKind::Interrupted | ErrorKind::TimedOut) => {
                    continue
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
    }

    /// Fill `buf` completely, using any pushed back bytes first.
    ///
    /// # Errors
    /// [Error::TruncatedFrame] if the reader times out before `buf` is full,
    /// [Error::StreamClosed] at EOF and [Error::Io] on other read failures.
    pub fn fill(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            if let Some(b) = self.cache.pop() {
                buf[filled] = b;
                filled += 1;
                continue;
            }
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => return Err(Error::StreamClosed),
                Ok(n) => {
                    self.num_read += n;
                    filled += n;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if is_pause(&err) => {
                    return Err(Error::TruncatedFrame {
                        actual: filled,
                        expected: buf.len(),
                    })
                }
                Err(err) => return Err(Error::Io(err)),
            }
        }
        Ok(())
    }

    /// Push bytes back to be returned by subsequent reads. Bytes are returned in
    /// reverse order of `dat`.
    pub fn push(&mut self, dat: &[u8]) {
        self.cache.extend_from_slice(dat);
    }

    /// Number of bytes consumed from the reader, not counting bytes pushed back.
    pub fn offset(&self) -> usize {
        self.num_read - self.cache.len()
    }
}
