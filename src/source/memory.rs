//! In-memory sample source

use crate::core::{SamplesBuffer, SourceFormat};
use crate::error::{AudioError, AudioResult};
use log::trace;

/// Sample source over an in-memory interleaved buffer
#[derive(Debug, Clone)]
pub struct MemorySource {
    data: Vec<u8>,
    format: SourceFormat,
    pulls: u64,
}

impl MemorySource {
    /// Wrap little-endian interleaved sample bytes
    pub fn new(data: Vec<u8>, format: SourceFormat) -> AudioResult<Self> {
        if data.len() % format.samplesize() != 0 {
            return Err(AudioError::ConfigError(
                "Buffer length not divisible by sample size".to_string(),
            ));
        }

        Ok(MemorySource {
            data,
            format,
            pulls: 0,
        })
    }

    /// Build a 16-bit source from interleaved samples
    pub fn from_i16(samples: &[i16], sample_rate: u32, channels: u16) -> AudioResult<Self> {
        let format = SourceFormat::new(sample_rate, channels, 2)?;
        let data = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::new(data, format)
    }

    /// Total number of multichannel samples
    pub fn total_samples(&self) -> u64 {
        (self.data.len() / self.format.samplesize()) as u64
    }

    /// Number of pulls served so far
    pub fn pulls(&self) -> u64 {
        self.pulls
    }
}

impl super::SampleSource for MemorySource {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn pull(&mut self, start: u64, end: u64) -> AudioResult<SamplesBuffer> {
        if end < start {
            return Err(AudioError::SourceRead(format!(
                "Invalid range {}..{}",
                start, end
            )));
        }
        self.pulls += 1;

        let total = self.total_samples();
        if start >= total {
            trace!("memory pull {}..{} past the end", start, end);
            return Ok(SamplesBuffer::end_of_stream());
        }
        let from = start.min(total) as usize * self.format.samplesize();
        let to = end.min(total) as usize * self.format.samplesize();
        trace!("memory pull {}..{} ({} bytes)", start, end, to - from);

        Ok(SamplesBuffer::new(self.data[from..to].to_vec(), end >= total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SampleSource;

    #[test]
    fn test_short_pull_at_end() {
        let mut source = MemorySource::from_i16(&[1, 2, 3, 4, 5, 6], 8000, 2).unwrap();
        assert_eq!(source.total_samples(), 3);

        let first = source.pull(0, 2).unwrap();
        assert_eq!(first.len(), 8);
        assert!(!first.is_eof());

        let last = source.pull(2, 4).unwrap();
        assert_eq!(last.as_bytes(), &[5, 0, 6, 0]);
        assert!(last.is_eof());
        assert_eq!(source.pulls(), 2);
    }

    #[test]
    fn test_exact_end_is_flagged() {
        let mut source = MemorySource::from_i16(&[1, 2, 3, 4], 8000, 1).unwrap();
        let batch = source.pull(0, 4).unwrap();
        assert_eq!(batch.len(), 8);
        assert!(batch.is_eof());
    }

    #[test]
    fn test_pull_past_end_is_empty() {
        let mut source = MemorySource::from_i16(&[1, 2], 8000, 1).unwrap();
        let batch = source.pull(10, 20).unwrap();
        assert!(batch.is_empty());
        assert!(batch.is_eof());
    }

    #[test]
    fn test_ragged_buffer_rejected() {
        let format = SourceFormat::new(8000, 2, 2).unwrap();
        assert!(MemorySource::new(vec![0; 6], format).is_err());
    }
}
