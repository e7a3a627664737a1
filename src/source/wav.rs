//! WAV file sample source

use crate::core::{SamplesBuffer, SourceFormat};
use crate::error::{AudioError, AudioResult};
use hound::{SampleFormat, WavReader};
use log::{debug, trace};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// WAV file source delivering samples in their native container size
///
/// Integer samples come out as signed little-endian values of `bits_per_sample / 8` bytes,
/// float samples as 32-bit little-endian floats. Nothing is converted.
pub struct WavSource {
    reader: WavReader<BufReader<File>>,
    format: SourceFormat,
    sample_format: SampleFormat,
    /// Total samples per channel
    length: u64,
    /// Next sample index the reader will yield
    position: u64,
}

impl WavSource {
    /// Open a WAV file
    pub fn open<P: AsRef<Path>>(path: P) -> AudioResult<Self> {
        let reader = WavReader::open(path.as_ref())?;
        let spec = reader.spec();

        let chansize = spec.bits_per_sample.div_ceil(8);
        let format = SourceFormat::new(spec.sample_rate, spec.channels, chansize)?;
        let length = reader.duration() as u64;

        debug!(
            "WAV source {}: {} Hz, {} channels, {} bits, {} samples",
            path.as_ref().display(),
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            length
        );

        Ok(WavSource {
            reader,
            format,
            sample_format: spec.sample_format,
            length,
            position: 0,
        })
    }

    /// Total number of multichannel samples in the file
    pub fn total_samples(&self) -> u64 {
        self.length
    }

    fn read_values(&mut self, count: usize, out: &mut Vec<u8>) -> AudioResult<()> {
        let chansize = self.format.chansize as usize;
        match self.sample_format {
            SampleFormat::Int => {
                for sample in self.reader.samples::<i32>().take(count) {
                    out.extend_from_slice(&sample?.to_le_bytes()[..chansize]);
                }
            }
            SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(count) {
                    out.extend_from_slice(&sample?.to_le_bytes());
                }
            }
        }
        Ok(())
    }
}

impl super::SampleSource for WavSource {
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

        let start = start.min(self.length);
        let end = end.min(self.length);
        if start != self.position {
            let target = u32::try_from(start)
                .map_err(|_| AudioError::SourceRead(format!("Cannot seek to {}", start)))?;
            self.reader
                .seek(target)
                .map_err(|e| AudioError::SourceRead(e.to_string()))?;
            self.position = start;
        }

        let wanted = (end - start) as usize;
        let mut data = Vec::with_capacity(wanted * self.format.samplesize());
        self.read_values(wanted * self.format.channels as usize, &mut data)
            .map_err(|e| match e {
                AudioError::SourceRead(_) => e,
                other => AudioError::SourceRead(other.to_string()),
            })?;

        let delivered = (data.len() / self.format.samplesize()) as u64;
        self.position += delivered;
        trace!("WAV pull {}..{} delivered {}", start, end, delivered);

        let eof = self.position >= self.length || delivered < wanted as u64;
        Ok(SamplesBuffer::new(data, eof))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SampleSource;
    use hound::{WavSpec, WavWriter};
    use tempfile::NamedTempFile;

    fn write_wav(path: &Path, bits: u16, channels: u16, frames: usize) {
        let spec = WavSpec {
            channels,
            sample_rate: 44100,
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..frames * channels as usize {
            writer.write_sample(i as i32).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_open_reports_format() {
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), 16, 2, 100);

        let source = WavSource::open(file.path()).unwrap();
        assert_eq!(source.format(), SourceFormat::new(44100, 2, 2).unwrap());
        assert_eq!(source.total_samples(), 100);
    }

    #[test]
    fn test_pull_native_bytes() {
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), 16, 1, 10);

        let mut source = WavSource::open(file.path()).unwrap();
        let batch = source.pull(2, 4).unwrap();
        assert_eq!(batch.as_bytes(), &[2, 0, 3, 0]);
        assert!(!batch.is_eof());

        let tail = source.pull(8, 12).unwrap();
        assert_eq!(tail.as_bytes(), &[8, 0, 9, 0]);
        assert!(tail.is_eof());
    }

    #[test]
    fn test_24_bit_container() {
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), 24, 1, 4);

        let mut source = WavSource::open(file.path()).unwrap();
        assert_eq!(source.format().chansize, 3);
        let batch = source.pull(0, 4).unwrap();
        assert_eq!(batch.len(), 12);
        assert!(batch.is_eof());
    }

    #[test]
    fn test_backward_pull_seeks() {
        let file = NamedTempFile::new().unwrap();
        write_wav(file.path(), 16, 1, 10);

        let mut source = WavSource::open(file.path()).unwrap();
        source.pull(0, 6).unwrap();
        let again = source.pull(1, 2).unwrap();
        assert_eq!(again.as_bytes(), &[1, 0]);
    }
}
