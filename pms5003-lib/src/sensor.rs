use std::io::Read;

use tracing::debug;

use crate::framing::Synchronizer;
use crate::stream::{Clock, MeasurementStream, StreamOpts, SystemClock};
use crate::{Result, TimestampedMeasurement};

/// Reads timestamped measurements from a PMS5003 byte stream.
///
/// # Example
/// Read a single measurement from a captured byte stream.
/// ```
/// use pms5003::{framing::encode, Measurement, Pms5003};
///
/// let frame = encode(&Measurement::from_fields([1; 13]));
/// let mut pms = Pms5003::new(&frame[..]);
/// let tm = pms.read_one().unwrap();
/// assert_eq!(tm.measurement.pm2_5, 1);
/// ```
pub struct Pms5003<R, C = SystemClock>
where
    R: Read + Send,
    C: Clock,
{
    sync: Synchronizer<R>,
    clock: C,
}

impl<R> Pms5003<R>
where
    R: Read + Send,
{
    pub fn new(reader: R) -> Self {
        Self::with_clock(reader, SystemClock)
    }
}

impl<R, C> Pms5003<R, C>
where
    R: Read + Send,
    C: Clock,
{
    /// Create using `clock` to timestamp measurements.
    pub fn with_clock(reader: R, clock: C) -> Self {
        Pms5003 {
            sync: Synchronizer::new(reader),
            clock,
        }
    }

    /// Attempt to read the next frame.
    ///
    /// The timestamp is taken after the last byte of the frame has been read.
    ///
    /// # Errors
    /// Frame errors, see [Error::is_recoverable](crate::Error::is_recoverable), as
    /// well as stream errors.
    pub fn try_read_one(&mut self) -> Result<TimestampedMeasurement> {
        let measurement = self.sync.frame()?;
        Ok(TimestampedMeasurement {
            timestamp: self.clock.now(),
            measurement,
        })
    }

    /// Read the next valid frame, skipping over any frames that fail to decode.
    ///
    /// # Errors
    /// If the stream is closed or fails.
    pub fn read_one(&mut self) -> Result<TimestampedMeasurement> {
        loop {
            match self.try_read_one() {
                Err(err) if err.is_recoverable() => {
                    debug!(offset = self.bytes_read(), "dropping frame: {err}");
                }
                zult => return zult,
            }
        }
    }

    /// Start streaming measurements with warmup and dedupe applied per `opts`.
    pub fn stream(self, opts: StreamOpts) -> MeasurementStream<R, C> {
        MeasurementStream::new(self, opts)
    }

    /// Number of bytes consumed from the reader.
    pub fn bytes_read(&self) -> usize {
        self.sync.offset()
    }

    pub(crate) fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{encode, FRAME_LEN};
    use crate::{Error, Measurement};

    fn measurement(x: u16) -> Measurement {
        Measurement::from_fields([x; Measurement::NUM_FIELDS])
    }

    #[test]
    fn read_one_skips_corrupt_frames() {
        let mut bad = encode(&measurement(1));
        bad[FRAME_LEN - 1] ^= 0xff;
        let mut dat = bad.to_vec();
        dat.extend_from_slice(&encode(&measurement(2)));

        let mut pms = Pms5003::new(&dat[..]);
        let tm = pms.read_one().expect("read to succeed");
        assert_eq!(tm.measurement, measurement(2));
        assert_eq!(pms.bytes_read(), FRAME_LEN * 2);
    }

    #[test]
    fn try_read_one_reports_corrupt_frames() {
        let mut bad = encode(&measurement(1));
        bad[FRAME_LEN - 1] ^= 0xff;

        let mut pms = Pms5003::new(&bad[..]);
        assert!(matches!(
            pms.try_read_one(),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn read_one_is_stream_closed_at_eof() {
        let mut pms = Pms5003::new(&[0u8; 10][..]);
        assert!(matches!(pms.read_one(), Err(Error::StreamClosed)));
    }
}
