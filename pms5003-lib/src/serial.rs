//! Opening a PMS5003 attached to a serial port.
use std::time::Duration;

use serialport::SerialPort;
use tracing::debug;

use crate::{Pms5003, Result};

/// Options used to open the serial port.
#[derive(Clone, Debug, PartialEq)]
pub struct SerialOpts {
    pub port: String,
    pub baud_rate: u32,
    /// Read timeout. A timeout while scanning for a frame is retried, a timeout in
    /// the middle of a frame drops the frame.
    pub timeout: Duration,
}

impl SerialOpts {
    pub const DEFAULT_PORT: &'static str = "/dev/ttyAMA0";
    pub const DEFAULT_BAUD_RATE: u32 = 9600;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

    #[must_use]
    pub fn new(port: &str) -> Self {
        SerialOpts {
            port: port.to_string(),
            baud_rate: Self::DEFAULT_BAUD_RATE,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for SerialOpts {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PORT)
    }
}

/// Open the serial port described by `opts`.
///
/// # Errors
/// [Error::Serial](crate::Error::Serial) if the port cannot be opened.
pub fn open(opts: &SerialOpts) -> Result<Pms5003<Box<dyn SerialPort>>> {
    debug!(port = %opts.port, baud_rate = opts.baud_rate, "opening serial port");
    let port = serialport::new(&opts.port, opts.baud_rate)
        .timeout(opts.timeout)
        .open()?;
    Ok(Pms5003::new(port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_opts() {
        let opts = SerialOpts::default();
        assert_eq!(opts.port, "/dev/ttyAMA0");
        assert_eq!(opts.baud_rate, 9600);
        assert_eq!(opts.timeout, Duration::from_secs(1));
    }

    #[test]
    fn open_missing_port_fails() {
        let opts = SerialOpts::new("/dev/this-port-does-not-exist");
        assert!(open(&opts).is_err());
    }
}
