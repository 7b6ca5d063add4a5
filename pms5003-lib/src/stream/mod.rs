//! Continuous measurement streaming with warmup and duplicate suppression.
mod clock;

pub use clock::*;

use std::io::Read;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, trace};

use crate::{Error, Measurement, Pms5003, Result, TimestampedMeasurement};

/// Options used for streaming.
#[derive(Clone, Debug, PartialEq)]
pub struct StreamOpts {
    /// Drop measurements equal to the one immediately before them.
    pub dedupe: bool,
    /// Time after the stream starts during which measurements are read but not emitted.
    pub warmup: Duration,
}

impl StreamOpts {
    /// Warmup suggested by the sensor manufacturer for the fan and optics to settle.
    pub const DEFAULT_WARMUP: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn new() -> Self {
        StreamOpts {
            dedupe: true,
            warmup: Self::DEFAULT_WARMUP,
        }
    }

    #[must_use]
    pub fn with_dedupe(mut self, dedupe: bool) -> Self {
        self.dedupe = dedupe;
        self
    }

    #[must_use]
    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    /// Set the warmup in seconds. Values that are not positive, including NaN,
    /// disable warmup.
    #[must_use]
    pub fn with_warmup_secs(self, secs: f64) -> Self {
        let warmup = if secs > 0.0 {
            Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        self.with_warmup(warmup)
    }
}

impl Default for StreamOpts {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts of what a [MeasurementStream] has done with the frames it has read.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Frames successfully decoded.
    pub frames: usize,
    pub checksum_errors: usize,
    pub truncated: usize,
    /// Decoded frames dropped because they arrived during warmup.
    pub warmup_discarded: usize,
    /// Decoded frames dropped because they equal the previous measurement.
    pub duplicates: usize,
    pub emitted: usize,
}

/// Iterator of [TimestampedMeasurement]s with warmup and dedupe applied.
///
/// Created using [Pms5003::stream] or [read_measurements](crate::read_measurements).
/// The warmup window starts on the first call to `next`.
///
/// ## Errors
/// Corrupt or truncated frames are dropped and the stream resynchronizes on the
/// next frame. Any other error, including [Error::StreamClosed], is produced once
/// after which the iterator ends.
pub struct MeasurementStream<R, C>
where
    R: Read + Send,
    C: Clock,
{
    pms: Pms5003<R, C>,
    opts: StreamOpts,
    started: bool,
    done: bool,
    previous: Option<Measurement>,
    warmup_deadline: Option<DateTime<Utc>>,
    stats: StreamStats,
}

impl<R, C> MeasurementStream<R, C>
where
    R: Read + Send,
    C: Clock,
{
    pub(crate) fn new(pms: Pms5003<R, C>, opts: StreamOpts) -> Self {
        MeasurementStream {
            pms,
            opts,
            started: false,
            done: false,
            previous: None,
            warmup_deadline: None,
            stats: StreamStats::default(),
        }
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Number of bytes consumed from the reader.
    pub fn bytes_read(&self) -> usize {
        self.pms.bytes_read()
    }

    /// True while measurements are being suppressed for warmup.
    pub fn in_warmup(&self) -> bool {
        if !self.started {
            return !self.opts.warmup.is_zero();
        }
        self.warmup_deadline.is_some()
    }

    /// End this stream, returning the sensor so another stream may be started on
    /// the same reader. Reading resumes wherever this stream left off.
    pub fn into_inner(self) -> Pms5003<R, C> {
        self.pms
    }

    fn start(&mut self) {
        self.started = true;
        if self.opts.warmup.is_zero() {
            return;
        }
        let start = self.pms.now();
        let deadline = TimeDelta::from_std(self.opts.warmup)
            .ok()
            .and_then(|delta| start.checked_add_signed(delta))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        debug!(%start, %deadline, "warming up");
        self.warmup_deadline = Some(deadline);
    }

    fn record_error(&mut self, err: &Error) {
        match err {
            Error::ChecksumMismatch { .. } => self.stats.checksum_errors += 1,
            Error::TruncatedFrame { .. } => self.stats.truncated += 1,
            _ => {}
        }
        debug!(offset = self.pms.bytes_read(), "dropping frame: {err}");
    }
}

impl<R, C> Iterator for MeasurementStream<R, C>
where
    R: Read + Send,
    C: Clock,
{
    type Item = Result<TimestampedMeasurement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if !self.started {
            self.start();
        }

        loop {
            let tm = match self.pms.try_read_one() {
                Ok(tm) => tm,
                Err(err) if err.is_recoverable() => {
                    self.record_error(&err);
                    continue;
                }
                Err(err) => {
                    debug!(stats = ?self.stats, "stream ended: {err}");
                    self.done = true;
                    return Some(Err(err));
                }
            };
            self.stats.frames += 1;

            if let Some(deadline) = self.warmup_deadline {
                if tm.timestamp < deadline {
                    self.stats.warmup_discarded += 1;
                    self.previous = Some(tm.measurement);
                    continue;
                }
                debug!(
                    discarded = self.stats.warmup_discarded,
                    "warmup complete"
                );
                self.warmup_deadline = None;
            }

            if self.opts.dedupe && self.previous == Some(tm.measurement) {
                trace!(timestamp = %tm.timestamp, "dropping duplicate measurement");
                self.stats.duplicates += 1;
                continue;
            }

            self.previous = Some(tm.measurement);
            self.stats.emitted += 1;
            return Some(Ok(tm));
        }
    }
}

/// Creates an iterator of measurements read from `reader`, timestamped using the
/// system clock.
///
/// For more control, e.g., a different [Clock], see [Pms5003].
pub fn read_measurements<R>(reader: R, opts: StreamOpts) -> MeasurementStream<R, SystemClock>
where
    R: Read + Send,
{
    Pms5003::new(reader).stream(opts)
}
