#![warn(missing_docs)]

//! # audenc: pluggable audio encoders for a video pipeline
//!
//! Turns a pull-based raw sample source into a pull-based stream of encoded packets, with
//! the codec picked at runtime from a registry.
//!
//! ## Features
//!
//! - **Registry** - codec lookup by name, `auto` selection over an allow-list
//! - **Encoders** - MP3 through LAME (`mp3` feature), raw PCM passthrough
//! - **Sources** - in-memory buffers, WAV files, anything Symphonia decodes
//! - **Pump** - drain an encoder into any `Write` sink
//!
//! ## Quick Start
//!
//! ```ignore
//! use audenc::encoder::{EncoderHandle, select_encoder};
//! use audenc::source::MemorySource;
//!
//! let mut source = MemorySource::from_i16(&samples, 44100, 2)?;
//! let codec = select_encoder("auto", Some(&["mp3", "raw"]))?;
//! let mut handle = EncoderHandle::open(codec, &mut source, "bitrate=192")?;
//!
//! while let Some(packet) = handle.next_packet()? {
//!     mux(packet.as_bytes());
//!     handle.free_packet(packet);
//! }
//! if let Some(packet) = handle.finish()? {
//!     mux(packet.as_bytes());
//! }
//! handle.close();
//! ```

/// Core audio types and structures
pub mod core;
/// Error types for audio operations
pub mod error;
/// Codec registry, encoder handle and backends
pub mod encoder;
/// Raw sample sources
pub mod source;
/// Encode loops
pub mod processor;

// Export public types
pub use crate::core::{AudioInfo, Packet, SamplesBuffer, SourceFormat};
pub use crate::encoder::{AudioEncoder, CodecDescriptor, EncoderHandle, select_encoder};
pub use crate::error::{AudioError, AudioResult};
pub use crate::source::SampleSource;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
