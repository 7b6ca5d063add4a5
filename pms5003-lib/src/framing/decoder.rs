use super::{FRAME_LEN, PAYLOAD_LEN, START_SEQUENCE};
use crate::{Error, Measurement, Result};

/// Number of payload bytes holding measurement data, i.e., the payload minus checksum.
const DATA_LEN: usize = Measurement::NUM_FIELDS * 2;

/// Sum of `dat`, modulo 65536.
#[must_use]
pub fn checksum(dat: &[u8]) -> u16 {
    dat.iter().fold(0u16, |sum, b| sum.wrapping_add(u16::from(*b)))
}

/// Decode the payload bytes following a [START_SEQUENCE] into a [Measurement].
///
/// The checksum in the final two bytes of the payload covers the start sequence as
/// well as the data bytes.
///
/// # Errors
/// [Error::TruncatedFrame] if `payload` is not exactly [PAYLOAD_LEN] bytes, and
/// [Error::ChecksumMismatch] if the computed checksum does not match the one in
/// the payload.
pub fn decode(payload: &[u8]) -> Result<Measurement> {
    if payload.len() != PAYLOAD_LEN {
        return Err(Error::TruncatedFrame {
            actual: payload.len(),
            expected: PAYLOAD_LEN,
        });
    }

    let (data, tail) = payload.split_at(DATA_LEN);
    let expected = u16::from_be_bytes([tail[0], tail[1]]);
    let actual = checksum(&START_SEQUENCE).wrapping_add(checksum(data));
    if actual != expected {
        return Err(Error::ChecksumMismatch { expected, actual });
    }

    let mut fields = [0u16; Measurement::NUM_FIELDS];
    for (field, chunk) in fields.iter_mut().zip(data.chunks_exact(2)) {
        *field = u16::from_be_bytes([chunk[0], chunk[1]]);
    }

    Ok(Measurement::from_fields(fields))
}

/// Encode a [Measurement] as a complete frame, including start sequence and checksum.
#[must_use]
pub fn encode(measurement: &Measurement) -> [u8; FRAME_LEN] {
    let mut frame = [0u8; FRAME_LEN];
    frame[..START_SEQUENCE.len()].copy_from_slice(&START_SEQUENCE);
    for (i, field) in measurement.fields().iter().enumerate() {
        let start = START_SEQUENCE.len() + i * 2;
        frame[start..start + 2].copy_from_slice(&field.to_be_bytes());
    }
    let sum = checksum(&frame[..FRAME_LEN - 2]);
    frame[FRAME_LEN - 2..].copy_from_slice(&sum.to_be_bytes());
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[rustfmt::skip]
    const FRAME: [u8; FRAME_LEN] = [
        0x42, 0x4d, 0x00, 0x1c,
        0x00, 0x0a, 0x00, 0x14, 0x00, 0x1e, // pm 10, 20, 30
        0x00, 0x0a, 0x00, 0x14, 0x00, 0x1e, // pm atm 10, 20, 30
        0x00, 0x64, 0x00, 0x5a, 0x00, 0x50, // counts 100, 90, 80
        0x00, 0x46, 0x00, 0x3c, 0x00, 0x32, // counts 70, 60, 50
        0x00, 0x00,                         // reserved
        0x02, 0xe5,                         // checksum 741
    ];

    #[test]
    fn decode_known_frame() {
        let m = decode(&FRAME[4..]).expect("decode to succeed");

        assert_eq!(
            m.fields(),
            [10, 20, 30, 10, 20, 30, 100, 90, 80, 70, 60, 50, 0]
        );
    }

    #[test]
    fn encode_known_frame() {
        let m = Measurement::from_fields([10, 20, 30, 10, 20, 30, 100, 90, 80, 70, 60, 50, 0]);
        assert_eq!(encode(&m), FRAME);
    }

    #[test]
    fn checksum_covers_start_sequence() {
        assert_eq!(checksum(&START_SEQUENCE), 0x42 + 0x4d + 0x1c);
        assert_eq!(checksum(&FRAME[..30]), 0x02e5);
    }

    #[test]
    fn checksum_wraps() {
        let dat = [0xffu8; 300];
        assert_eq!(checksum(&dat), ((300u32 * 0xff) % 65536) as u16);
    }

    #[test]
    fn encode_max_values_wraps_checksum() {
        let m = Measurement::from_fields([u16::MAX; Measurement::NUM_FIELDS]);
        let frame = encode(&m);
        assert_eq!(decode(&frame[4..]).unwrap(), m);
    }

    #[test]
    fn decode_checksum_mismatch() {
        let mut frame = FRAME;
        frame[7] ^= 0x01;

        let zult = decode(&frame[4..]);
        match zult {
            Err(Error::ChecksumMismatch { expected, actual }) => {
                assert_eq!(expected, 0x02e5);
                assert_eq!(actual, 0x02e6);
            }
            _ => panic!("expected checksum mismatch, got {zult:?}"),
        }
    }

    #[test]
    fn decode_corrupt_checksum_bytes() {
        let mut frame = FRAME;
        frame[31] = 0x00;
        assert!(matches!(
            decode(&frame[4..]),
            Err(Error::ChecksumMismatch { .. })
        ));
    }

    #[test_case(0 ; "empty")]
    #[test_case(27 ; "one short")]
    #[test_case(29 ; "one long")]
    fn decode_wrong_length_is_truncated(len: usize) {
        let payload = vec![0u8; len];
        let zult = decode(&payload);
        assert!(
            matches!(zult, Err(Error::TruncatedFrame { actual, expected: PAYLOAD_LEN }) if actual == len),
            "got {zult:?}"
        );
    }
}
