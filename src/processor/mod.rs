//! Encode loops driving an encoder handle

pub mod pump;

pub use pump::PacketPump;

/// Encode loop counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Packets written
    pub packets: u64,
    /// Encoded bytes written
    pub bytes: u64,
    /// Samples the encoder pulled, counted in whole frames
    pub samples: u64,
}
