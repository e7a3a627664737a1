//! Raw sample sources feeding the encoders

pub mod memory;
pub mod decoded;
pub mod wav;

pub use memory::MemorySource;
pub use decoded::DecodedSource;
pub use wav::WavSource;

use crate::core::{SamplesBuffer, SourceFormat};
use crate::error::AudioResult;
use std::path::Path;

/// Pull-based supplier of interleaved raw samples
///
/// Sample indices count multichannel samples from the start of the stream.
pub trait SampleSource: Send {
    /// Layout of the samples this source delivers
    fn format(&self) -> SourceFormat;

    /// Pull the samples in `[start, end)`
    ///
    /// The batch may only be shorter than requested at the end of the stream, in which case
    /// its end-of-stream flag is set. A batch reaching the last sample is flagged as well.
    fn pull(&mut self, start: u64, end: u64) -> AudioResult<SamplesBuffer>;
}

/// Open a file as a sample source, picking the reader by extension
pub fn from_file<P: AsRef<Path>>(path: P) -> AudioResult<Box<dyn SampleSource>> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);

    if is_wav {
        WavSource::open(path).map(|s| Box::new(s) as Box<dyn SampleSource>)
    } else {
        DecodedSource::open(path).map(|s| Box::new(s) as Box<dyn SampleSource>)
    }
}
