//! CRC-16/Modbus checksum used on every RTU frame.
//!
//! Reflected polynomial 0xA001, seed 0xFFFF, processed LSB-first one bit at
//! a time. The checksum trails the frame low byte first, so on the wire a
//! frame always ends `[..., crc_lo, crc_hi]`.

const POLYNOMIAL: u16 = 0xA001;
const INITIAL_VALUE: u16 = 0xFFFF;

/// Minimum length of a verifiable frame: one data byte plus the two CRC bytes.
pub const MIN_FRAME_LEN: usize = 3;

/// Computes the CRC-16/Modbus checksum over `data`.
///
/// An empty slice yields the seed value 0xFFFF.
pub fn calculate(data: &[u8]) -> u16 {
    let mut crc = INITIAL_VALUE;

    for &byte in data {
        crc ^= byte as u16;
        for _ in 0..8 {
            if crc & 0x0001 != 0 {
                crc = (crc >> 1) ^ POLYNOMIAL;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}

/// Checks the trailing little-endian checksum of a complete frame.
///
/// Returns `false` for frames shorter than [`MIN_FRAME_LEN`] or on mismatch.
/// A frame failing this check must be discarded whole, never partially
/// interpreted.
pub fn verify(frame: &[u8]) -> bool {
    if frame.len() < MIN_FRAME_LEN {
        return false;
    }

    let data_len = frame.len() - 2;
    let calculated = calculate(&frame[..data_len]);
    let received = u16::from_le_bytes([frame[data_len], frame[data_len + 1]]);

    calculated == received
}

/// Computes the checksum over the current buffer contents and appends it,
/// low byte first.
pub fn append(frame: &mut Vec<u8>) {
    let crc = calculate(frame);
    frame.extend_from_slice(&crc.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_vectors() {
        // Read-holding request for one register at address 0
        assert_eq!(calculate(&[0x01, 0x03, 0x00, 0x00, 0x00, 0x01]), 0x0A84);
        assert_eq!(calculate(&[0x00]), 0x40BF);
    }

    #[test]
    fn test_empty_input_yields_seed() {
        assert_eq!(calculate(&[]), 0xFFFF);
    }

    #[test]
    fn test_append_then_verify_round_trip() {
        let samples: [&[u8]; 4] = [
            &[0x01],
            &[0x01, 0x03, 0x00, 0x00, 0x00, 0x1C],
            &[0x05, 0x06, 0x00, 0x03, 0x12, 0x34],
            &[0xFF; 32],
        ];

        for sample in samples {
            let mut frame = sample.to_vec();
            append(&mut frame);
            assert_eq!(frame.len(), sample.len() + 2);
            assert!(verify(&frame), "frame {:02X?} failed verification", frame);
        }
    }

    #[test]
    fn test_verify_rejects_short_frames() {
        assert!(!verify(&[]));
        assert!(!verify(&[0x01]));
        assert!(!verify(&[0x01, 0x02]));
    }

    #[test]
    fn test_verify_rejects_any_flipped_crc_bit() {
        let mut frame = vec![0x01, 0x03, 0x02, 0x12, 0x34];
        append(&mut frame);

        let crc_start = frame.len() - 2;
        for byte_idx in crc_start..frame.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[byte_idx] ^= 1 << bit;
                assert!(!verify(&corrupted));
            }
        }
    }

    #[test]
    fn test_crc_is_little_endian_on_the_wire() {
        let mut frame = vec![0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
        append(&mut frame);
        // 0x0A84 lands as [0x84, 0x0A]
        assert_eq!(&frame[6..], &[0x84, 0x0A]);
    }
}
