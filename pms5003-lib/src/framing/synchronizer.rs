use std::io::Read;

use tracing::trace;

use super::bytes::Bytes;
use super::{decode, PAYLOAD_LEN, START_SEQUENCE};
use crate::{Error, Measurement, Result};

/// Synchronizer scans a byte stream for frames indicated by the [START_SEQUENCE].
///
/// Any bytes that are not part of a start sequence are dropped, so a stream may begin
/// mid-frame or contain noise between frames.
pub struct Synchronizer<R>
where
    R: Read + Send,
{
    bytes: Bytes<R>,
}

impl<R> Synchronizer<R>
where
    R: Read + Send,
{
    pub fn new(reader: R) -> Self {
        Synchronizer {
            bytes: Bytes::new(reader),
        }
    }

    /// Scan the stream until the next start sequence has been consumed.
    ///
    /// On a mismatch the bytes matched so far are dropped and the mismatching byte is
    /// checked again as the possible first byte of a start sequence.
    ///
    /// # Errors
    /// [Error::StreamClosed] if the reader reaches EOF before a start sequence is
    /// found. Any other read error results in [Error::Io].
    pub fn scan(&mut self) -> Result<()> {
        let mut idx = 0;
        let mut skipped = 0usize;
        while idx < START_SEQUENCE.len() {
            let b = self.bytes.next()?;
            if b == START_SEQUENCE[idx] {
                idx += 1;
                continue;
            }
            if idx > 0 {
                skipped += idx;
                self.bytes.push(&[b]);
            } else {
                skipped += 1;
            }
            idx = 0;
        }
        if skipped > 0 {
            trace!(skipped, offset = self.offset(), "dropped bytes before start sequence");
        }
        Ok(())
    }

    /// Read the payload that follows a start sequence.
    ///
    /// # Errors
    /// [Error::TruncatedFrame] if the reader pauses before the payload is complete,
    /// [Error::StreamClosed] on EOF.
    pub fn payload(&mut self) -> Result<[u8; PAYLOAD_LEN]> {
        let mut buf = [0u8; PAYLOAD_LEN];
        self.bytes.fill(&mut buf)?;
        Ok(buf)
    }

    /// Scan for, read, and decode the next frame.
    ///
    /// # Errors
    /// Any error from [Synchronizer::scan], [Synchronizer::payload] or
    /// [decode](super::decode). Use [Error::is_recoverable] to determine if scanning
    /// may continue.
    pub fn frame(&mut self) -> Result<Measurement> {
        self.scan()?;
        let payload = self.payload()?;
        decode(&payload)
    }

    /// Total number of bytes consumed from the reader.
    pub fn offset(&self) -> usize {
        self.bytes.offset()
    }
}

impl<R> IntoIterator for Synchronizer<R>
where
    R: Read + Send,
{
    type Item = Result<Measurement>;
    type IntoIter = FrameIter<R>;

    fn into_iter(self) -> Self::IntoIter {
        FrameIter {
            sync: self,
            done: false,
        }
    }
}

/// Iterates over decoded frames, including those that failed to decode. Created using
/// ``Synchronizer::into_iter``.
///
/// ## Errors
/// The iterator ends when the stream is closed. Recoverable frame errors are passed
/// on and iteration may continue; any other error is passed on once and then the
/// iterator ends.
pub struct FrameIter<R>
where
    R: Read + Send,
{
    sync: Synchronizer<R>,
    done: bool,
}

impl<R> Iterator for FrameIter<R>
where
    R: Read + Send,
{
    type Item = Result<Measurement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.sync.frame() {
            Ok(m) => Some(Ok(m)),
            Err(Error::StreamClosed) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = !err.is_recoverable();
                Some(Err(err))
            }
        }
    }
}

/// Creates an iterator over the frames in `reader`.
///
/// This does not apply any warmup or duplicate filtering, see
/// [read_measurements](crate::read_measurements) for that.
pub fn read_frames<'a, R>(reader: R) -> impl Iterator<Item = Result<Measurement>> + 'a
where
    R: Read + Send + 'a,
{
    Synchronizer::new(reader).into_iter()
}
