//! PMS5003 frame synchronization and decoding.
//!
//! A frame is 32 bytes: a 2 byte magic (`0x42 0x4d`), a 2 byte length of the
//! remaining bytes (always 28), 13 big-endian `u16` data fields and a big-endian
//! `u16` checksum that is the sum of all preceding bytes.
mod bytes;
mod decoder;
mod synchronizer;

pub use decoder::*;
pub use synchronizer::*;

/// Magic bytes and frame length that together mark the start of a frame.
pub const START_SEQUENCE: [u8; 4] = [0x42, 0x4d, 0x00, 0x1c];

/// Number of bytes following the [START_SEQUENCE].
pub const PAYLOAD_LEN: usize = 28;

/// Total length of a frame on the wire.
pub const FRAME_LEN: usize = START_SEQUENCE.len() + PAYLOAD_LEN;
