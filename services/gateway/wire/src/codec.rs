//! Top-level packet codec: stream cipher composed with framing.
//!
//! Received packets are decrypted in place and parsed; outbound messages
//! are built as plaintext and encrypted in place. The pip seeding the
//! cipher travels unencrypted in bytes 2..4 of every packet.

use bytes::BytesMut;
use rand::Rng;
use tracing::trace;

use crate::cipher;
use crate::error::ProtocolError;
use crate::packet::{Message, BODY_OFFSET, MIN_PACKET_SIZE};

/// Decrypt `raw` in place and parse it into a [`Message`].
///
/// `raw` is left decrypted regardless of outcome; on error the caller
/// should discard the buffer and keep listening.
pub fn decode_packet(raw: &mut [u8]) -> Result<Message, ProtocolError> {
    if raw.len() < MIN_PACKET_SIZE {
        return Err(ProtocolError::ShortPacket(raw.len()));
    }

    let pip = u16::from_be_bytes([raw[2], raw[3]]);
    trace!(len = raw.len(), pip, "decrypting packet body");
    cipher::apply(cipher::ENCRYPTION_ID, pip, &mut raw[BODY_OFFSET..]);

    Message::parse(raw)
}

/// Encode `message` into wire bytes, drawing a random pip from `rng`.
pub fn encode_packet<R: Rng>(message: &Message, rng: &mut R) -> BytesMut {
    encode_packet_with_pip(message, rng.gen())
}

/// Encode `message` into wire bytes with a caller-chosen pip.
///
/// Useful wherever the pip must be reproducible: tests, protocol traces,
/// relaying a packet under its original pip.
pub fn encode_packet_with_pip(message: &Message, pip: u16) -> BytesMut {
    let mut raw = message.build(pip);
    cipher::apply(cipher::ENCRYPTION_ID, pip, &mut raw[BODY_OFFSET..]);
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trv_message(records: Vec<Record>) -> Message {
        Message {
            manufacturer_id: 4,
            product_id: 3,
            sensor_id: 0x00097F,
            records,
        }
    }

    #[test]
    fn test_golden_join_packet() {
        let mut raw = [
            0x04, 0x03, 0x65, 0xCE, 0xA0, 0x97, 0x51, 0xAC, 0xC2, 0xF4, 0xA2, 0x19,
        ];
        let message = decode_packet(&mut raw).unwrap();
        assert_eq!(message, trv_message(vec![Record::Join]));
    }

    #[test]
    fn test_golden_voltage_packet() {
        let mut raw = [
            0x04, 0x03, 0x13, 0x04, 0x20, 0x3B, 0x19, 0xD5, 0x8C, 0xF1, 0x5F, 0xF1, 0xD3, 0x7B,
        ];
        let message = decode_packet(&mut raw).unwrap();
        assert_eq!(message, trv_message(vec![Record::Voltage(3.12109375)]));
    }

    #[test]
    fn test_golden_temperature_packet() {
        let mut raw = [
            0x04, 0x03, 0x0F, 0x42, 0x89, 0x00, 0x3A, 0x46, 0x9C, 0xA6, 0xE2, 0x35, 0x1F, 0xDC,
        ];
        let message = decode_packet(&mut raw).unwrap();
        assert_eq!(message, trv_message(vec![Record::Temperature(17.69921875)]));
    }

    #[test]
    fn test_golden_join_reencodes_to_wire_bytes() {
        // Re-encoding under the original pip reproduces the capture
        let expected = [
            0x04, 0x03, 0x65, 0xCE, 0xA0, 0x97, 0x51, 0xAC, 0xC2, 0xF4, 0xA2, 0x19,
        ];
        let raw = encode_packet_with_pip(&trv_message(vec![Record::Join]), 0x65CE);
        assert_eq!(&raw[..], &expected[..]);
    }

    #[test]
    fn test_round_trip_with_fixed_pips() {
        let message = trv_message(vec![
            Record::Temperature(-7.25),
            Record::Voltage(2.90625),
            Record::Identify,
            Record::Unhandled {
                param: 0xA5,
                type_desc: 0x01,
                value: vec![0x02],
            },
        ]);

        for pip in [0x0000, 0x0001, 0x65CE, 0xFFFF] {
            let mut raw = encode_packet_with_pip(&message, pip);
            assert_eq!(decode_packet(&mut raw).unwrap(), message, "pip {:#06x}", pip);
        }
    }

    #[test]
    fn test_round_trip_with_rng_pip() {
        let message = trv_message(vec![Record::Join, Record::Temperature(21.5)]);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..32 {
            let mut raw = encode_packet(&message, &mut rng);
            assert_eq!(decode_packet(&mut raw).unwrap(), message);
        }
    }

    #[test]
    fn test_short_buffer_rejected() {
        let mut raw = [0u8; 9];
        assert_eq!(decode_packet(&mut raw), Err(ProtocolError::ShortPacket(9)));
    }

    #[test]
    fn test_corrupted_body_rejected() {
        let original = [
            0x04, 0x03, 0x0F, 0x42, 0x89, 0x00, 0x3A, 0x46, 0x9C, 0xA6, 0xE2, 0x35, 0x1F, 0xDC,
        ];
        // Flip each payload bit in turn; the CRC must catch every one
        for i in BODY_OFFSET..original.len() {
            for bit in 0..8 {
                let mut raw = original;
                raw[i] ^= 1 << bit;
                assert!(
                    matches!(
                        decode_packet(&mut raw),
                        Err(ProtocolError::CrcMismatch { .. })
                    ),
                    "byte {} bit {}",
                    i,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_unknown_record_relays_unchanged() {
        let mut raw = encode_packet_with_pip(
            &trv_message(vec![Record::Unhandled {
                param: 0xD2,
                type_desc: 0x02,
                value: vec![0x01, 0x2C],
            }]),
            0x4242,
        );
        let original_wire = raw.clone();

        // Decode and re-encode under the same pip: bytes must be identical
        let message = decode_packet(&mut raw).unwrap();
        let again = encode_packet_with_pip(&message, 0x4242);
        assert_eq!(again, original_wire);
    }
}
