#![doc = include_str!("../README.md")]

mod error;
mod measurement;
mod sensor;

pub mod framing;
pub mod stream;

#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Error, Result};
pub use measurement::{Measurement, TimestampedMeasurement};
pub use sensor::Pms5003;
pub use stream::{read_measurements, MeasurementStream, StreamOpts};
