//! Packet envelope parsing and building.
//!
//! A plaintext packet is laid out as
//! `[manu][prod][pip_hi][pip_lo][sensor id: 3][records...][0x00][crc_hi][crc_lo]`.
//! The CRC covers the sensor id through the record terminator, the same
//! range the cipher covers on the wire. This module works on plaintext
//! only; en/decryption happens in [`crate::codec`].

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

use crate::crc;
use crate::error::ProtocolError;
use crate::record::Record;

/// Minimum length of a viable envelope: header (2) + pip (2) + sensor id
/// (3) + record terminator (1) + CRC (2).
pub const MIN_PACKET_SIZE: usize = 10;

/// Offset where the encrypted region, and with it the CRC range, begins.
pub(crate) const BODY_OFFSET: usize = 4;

/// Offset of the first record field.
const RECORDS_OFFSET: usize = 7;

/// One OpenThings message: the envelope identity plus its records.
///
/// Produced by parsing a received packet, or constructed directly by a
/// caller that wants to transmit. Records keep their wire order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Manufacturer id from the packet header
    pub manufacturer_id: u8,
    /// Product id from the packet header
    pub product_id: u8,
    /// 24-bit device address, big-endian on the wire
    pub sensor_id: u32,
    /// Records in wire order
    pub records: Vec<Record>,
}

impl Message {
    /// Parse a decrypted packet.
    ///
    /// Every index into `plain` is length-checked first; malformed input
    /// yields an error, never a panic.
    pub fn parse(plain: &[u8]) -> Result<Message, ProtocolError> {
        if plain.len() < MIN_PACKET_SIZE {
            return Err(ProtocolError::ShortPacket(plain.len()));
        }

        let crc_offset = plain.len() - 2;
        let wire = u16::from_be_bytes([plain[crc_offset], plain[crc_offset + 1]]);
        let computed = crc::checksum(&plain[BODY_OFFSET..crc_offset]);
        if wire != computed {
            return Err(ProtocolError::CrcMismatch { wire, computed });
        }

        let sensor_id = u32::from(plain[4]) << 16 | u32::from(plain[5]) << 8 | u32::from(plain[6]);

        let mut records = Vec::new();
        let mut cursor = RECORDS_OFFSET;
        while plain[cursor] != 0 {
            // param id and type descriptor, with the CRC trailer still intact
            if cursor + 4 > plain.len() {
                return Err(ProtocolError::ShortPacket(plain.len()));
            }
            let param = plain[cursor];
            let type_desc = plain[cursor + 1];
            let dlen = usize::from(type_desc & 0x0F);
            let value_end = cursor + 2 + dlen;
            if value_end + 2 > plain.len() {
                return Err(ProtocolError::ShortPacket(plain.len()));
            }

            trace!(param, type_desc, dlen, "decoding record");
            records.push(Record::decode(param, type_desc, &plain[cursor + 2..value_end])?);
            cursor = value_end;
        }

        Ok(Message {
            manufacturer_id: plain[0],
            product_id: plain[1],
            sensor_id,
            records,
        })
    }

    /// Build the plaintext packet for this message with the given pip.
    ///
    /// The CRC is computed over exactly the range [`parse`](Self::parse)
    /// validates: sensor id through the record terminator.
    pub fn build(&self, pip: u16) -> BytesMut {
        let mut buf = BytesMut::with_capacity(MIN_PACKET_SIZE + self.records.len() * 4);
        buf.put_u8(self.manufacturer_id);
        buf.put_u8(self.product_id);
        buf.put_u16(pip);
        buf.put_u8((self.sensor_id >> 16) as u8);
        buf.put_u8((self.sensor_id >> 8) as u8);
        buf.put_u8(self.sensor_id as u8);

        for record in &self.records {
            record.encode(&mut buf);
        }
        buf.put_u8(0); // record terminator

        let crc = crc::checksum(&buf[BODY_OFFSET..]);
        buf.put_u16(crc);
        buf
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{ManuId:{} ProdId:{} SensorId:{:06x} Records:[",
            self.manufacturer_id, self.product_id, self.sensor_id
        )?;
        for (i, record) in self.records.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", record)?;
        }
        write!(f, "]}}")
    }
}
