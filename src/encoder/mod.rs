//! Audio encoder implementations

pub mod handle;
#[cfg(feature = "mp3")]
pub mod mp3;
pub mod options;
pub mod raw;
pub mod registry;

pub use handle::EncoderHandle;
#[cfg(feature = "mp3")]
pub use mp3::Mp3Encoder;
pub use options::{COMMON_OPTIONS, Options};
pub use raw::RawEncoder;
pub use registry::{encoder_by_name, registered, select_encoder};

use crate::core::{AudioInfo, SourceFormat};
use crate::error::AudioResult;
use crate::source::SampleSource;

/// Operations every codec backend provides
///
/// An encoder owns its codec state and the read cursor. The sample source and the output
/// buffer are lent to it per call by the [`EncoderHandle`].
pub trait AudioEncoder {
    /// Stream description computed at open
    fn info(&self) -> &AudioInfo;

    /// Worst-case size of one packet in bytes
    fn max_packet_size(&self) -> usize;

    /// Next sample index to pull
    fn position(&self) -> u64;

    /// Pull and encode until one packet is ready in `out`
    ///
    /// Returns `false` once the stream is exhausted; `out` is then left empty.
    fn encode_next(
        &mut self,
        source: &mut dyn SampleSource,
        out: &mut Vec<u8>,
    ) -> AudioResult<bool>;

    /// Move the cursor forward without producing output
    fn skip_samples(&mut self, count: u64);

    /// Flush whatever the codec still holds into `out`
    ///
    /// Returns `false` when nothing was left.
    fn finish(&mut self, out: &mut Vec<u8>) -> AudioResult<bool>;
}

/// Backend a descriptor instantiates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodecKind {
    Raw,
    #[cfg(feature = "mp3")]
    Mp3,
}

/// Statically registered codec entry
#[derive(Debug)]
pub struct CodecDescriptor {
    name: &'static str,
    options: &'static [&'static str],
    kind: CodecKind,
}

impl CodecDescriptor {
    /// Registered codec name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Codec-specific option keys, on top of [`COMMON_OPTIONS`]
    pub fn options(&self) -> &'static [&'static str] {
        self.options
    }

    /// Configure a new encoder for samples laid out as `format`
    pub fn init(&self, format: &SourceFormat, opts: &str) -> AudioResult<Box<dyn AudioEncoder>> {
        match self.kind {
            CodecKind::Raw => Ok(Box::new(RawEncoder::new(format, opts)?)),
            #[cfg(feature = "mp3")]
            CodecKind::Mp3 => Ok(Box::new(Mp3Encoder::new(format, opts)?)),
        }
    }
}

impl PartialEq for CodecDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Raw PCM passthrough
pub static RAW: CodecDescriptor = CodecDescriptor {
    name: "raw",
    options: raw::OPTIONS,
    kind: CodecKind::Raw,
};

/// MP3 through LAME
#[cfg(feature = "mp3")]
pub static MP3: CodecDescriptor = CodecDescriptor {
    name: "mp3",
    options: mp3::OPTIONS,
    kind: CodecKind::Mp3,
};
