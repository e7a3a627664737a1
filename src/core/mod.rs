//! Core audio types and structures

/// Stream description, sample batches and packets
pub mod audio;

pub use audio::{AudioInfo, Packet, SamplesBuffer, SourceFormat};
