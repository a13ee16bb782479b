//! CRC-16 integrity check for the packet trailer.
//!
//! Polynomial `0x1021`, initial remainder 0, processed MSB-first with no
//! reflection and no final XOR (the XMODEM parameterization). Computed over
//! the plaintext from the sensor id through the record terminator and
//! carried big-endian in the last two bytes of the packet.

use crc::{Crc, CRC_16_XMODEM};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Compute the checksum over `data`. Empty input yields 0.
pub fn checksum(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}
