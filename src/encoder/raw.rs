//! Raw PCM passthrough encoder

use super::AudioEncoder;
use super::options::Options;
use crate::core::{AudioInfo, SourceFormat};
use crate::error::{AudioError, AudioResult};
use crate::source::SampleSource;
use log::{debug, trace};

/// Option keys specific to the raw encoder
pub const OPTIONS: &[&str] = &["framelen"];

/// Samples per packet unless `framelen` says otherwise
pub const DEFAULT_FRAMELEN: usize = 1024;

/// PCM passthrough: every pulled batch becomes a packet as is
pub struct RawEncoder {
    info: AudioInfo,
    cursor: u64,
    finished: bool,
}

impl RawEncoder {
    /// Create a raw encoder for `format`
    pub fn new(format: &SourceFormat, opts: &str) -> AudioResult<Self> {
        let options = Options::parse(opts, OPTIONS)?;
        let framelen = options
            .parse_value::<usize>("framelen")?
            .unwrap_or(DEFAULT_FRAMELEN);
        if framelen == 0 {
            return Err(AudioError::ConfigError(
                "framelen must be positive".to_string(),
            ));
        }

        let bitrate = u64::from(format.sample_rate)
            * u64::from(format.channels)
            * u64::from(format.chansize)
            * 8;
        let bitrate = u32::try_from(bitrate).map_err(|_| {
            AudioError::ConfigError(format!("PCM bitrate {} bit/s out of range", bitrate))
        })?;
        let info = AudioInfo::new("raw", format, framelen).with_bitrate(bitrate);
        debug!("raw encoder: {} samples per packet", framelen);

        Ok(RawEncoder {
            info,
            cursor: 0,
            finished: false,
        })
    }
}

impl AudioEncoder for RawEncoder {
    fn info(&self) -> &AudioInfo {
        &self.info
    }

    fn max_packet_size(&self) -> usize {
        self.info.framesize
    }

    fn position(&self) -> u64 {
        self.cursor
    }

    fn encode_next(
        &mut self,
        source: &mut dyn SampleSource,
        out: &mut Vec<u8>,
    ) -> AudioResult<bool> {
        out.clear();

        while !self.finished {
            let start = self.cursor;
            let end = start.saturating_add(self.info.framelen as u64);
            let batch = source.pull(start, end).map_err(|e| match e {
                AudioError::SourceRead(_) => e,
                other => AudioError::SourceRead(other.to_string()),
            })?;
            self.cursor = end;
            self.finished = batch.is_eof();
            trace!("raw pull {}..{}: {} bytes", start, end, batch.len());

            if !batch.is_empty() {
                out.extend_from_slice(batch.as_bytes());
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn skip_samples(&mut self, count: u64) {
        self.cursor = self.cursor.saturating_add(count);
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> AudioResult<bool> {
        // Nothing is ever held back
        out.clear();
        self.finished = true;
        Ok(false)
    }
}
