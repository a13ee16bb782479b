//! Wire protocol error types.

use thiserror::Error;

/// Errors produced while decoding an OpenThings packet.
///
/// Both variants are recoverable: the bytes came off an untrusted radio
/// channel, so a receiver should discard the packet and keep listening.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer too small for a well-formed envelope, or a record's declared
    /// length runs past the buffer
    #[error("short packet: {0} bytes")]
    ShortPacket(usize),

    /// Integrity mismatch, implying corruption or a wrong encryption id/pip
    #[error("crc mismatch: wire {wire:#06x}, computed {computed:#06x}")]
    CrcMismatch {
        /// Checksum carried in the packet trailer
        wire: u16,
        /// Checksum computed over the received plaintext
        computed: u16,
    },
}
