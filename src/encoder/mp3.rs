//! MP3 encoder backed by LAME.

use super::AudioEncoder;
use super::options::Options;
use crate::core::{AudioInfo, SamplesBuffer, SourceFormat};
use crate::error::{AudioError, AudioResult};
use crate::source::SampleSource;
use log::{debug, trace, warn};
use mp3lame_encoder::{
    Bitrate, Builder, FlushGap, InterleavedPcm, MonoPcm, Quality, VbrMode,
    max_required_buffer_size,
};

/// Option keys specific to the MP3 encoder
pub const OPTIONS: &[&str] = &["bitrate", "vbr", "quality"];

/// Sample rates LAME encodes without resampling
const SAMPLE_RATES: &[u32] = &[8000, 11025, 12000, 16000, 22050, 24000, 32000, 44100, 48000];

/// Rate control requested through the options
#[derive(Debug, Clone, Copy, PartialEq)]
enum RateControl {
    /// Constant bitrate in kbps
    Constant(u32),
    /// VBR quality target, 0 (best) to 9
    Variable(u8),
}

impl RateControl {
    fn from_options(options: &Options) -> AudioResult<Self> {
        let cbr = options.parse_value::<u32>("bitrate")?;
        let vbr = options.parse_value::<u8>("vbr")?;

        let mode = match (cbr, vbr) {
            (Some(kbps), None) => RateControl::Constant(kbps),
            (None, Some(quality)) => RateControl::Variable(quality),
            (Some(_), Some(_)) => {
                return Err(AudioError::ConfigError(
                    "'bitrate' and 'vbr' are mutually exclusive".to_string(),
                ));
            }
            (None, None) => {
                return Err(AudioError::ConfigError(
                    "One of 'bitrate' or 'vbr' is required".to_string(),
                ));
            }
        };

        match mode {
            RateControl::Constant(kbps) => {
                bitrate(kbps)?;
            }
            RateControl::Variable(target) => {
                if target > 9 {
                    return Err(AudioError::ConfigError(format!(
                        "VBR quality must be in 0-9, got {}",
                        target
                    )));
                }
            }
        }

        if let Some(is_vbr) = options.flag("is_vbr")? {
            if is_vbr != matches!(mode, RateControl::Variable(_)) {
                return Err(AudioError::ConfigError(
                    "'is_vbr' contradicts the rate control options".to_string(),
                ));
            }
        }

        Ok(mode)
    }
}

fn bitrate(kbps: u32) -> AudioResult<Bitrate> {
    let bitrate = match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => {
            return Err(AudioError::ConfigError(format!(
                "Unsupported MP3 bitrate {} kbps",
                other
            )));
        }
    };
    Ok(bitrate)
}

fn quality_level(level: u8) -> AudioResult<Quality> {
    let quality = match level {
        0 => Quality::Best,
        1 => Quality::SecondBest,
        2 => Quality::NearBest,
        3 => Quality::VeryNice,
        4 => Quality::Nice,
        5 => Quality::Good,
        6 => Quality::Decent,
        7 => Quality::Ok,
        8 => Quality::SecondWorst,
        9 => Quality::Worst,
        other => {
            return Err(AudioError::ConfigError(format!(
                "Quality must be 0-9, got {}",
                other
            )));
        }
    };
    Ok(quality)
}

/// Samples per MP3 frame: MPEG-1 layer III above 32 kHz, MPEG-2/2.5 below
pub fn frame_length(sample_rate: u32) -> usize {
    if sample_rate >= 32000 { 1152 } else { 576 }
}

/// Where the stream stands between calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    /// More input may be pulled
    Active,
    /// The source is exhausted, the reservoir still has to be flushed
    Draining,
    /// Flushed; nothing more comes out
    Finished,
    /// The source failed
    Failed,
}

/// Streaming MP3 encoder
///
/// Pulls one MP3 frame of 16-bit samples at a time. LAME keeps a reservoir and may produce
/// nothing for a given frame, so a packet can span several pulls.
pub struct Mp3Encoder {
    // Declared first so the engine is released before the rest
    lame: mp3lame_encoder::Encoder,
    info: AudioInfo,
    cursor: u64,
    bufsize: usize,
    state: StreamState,
}

impl Mp3Encoder {
    /// Validate the input layout and options, then configure LAME
    pub fn new(format: &SourceFormat, opts: &str) -> AudioResult<Self> {
        if format.chansize != 2 {
            warn!(
                "lame only supports 16 bits per channel, source has {}",
                format.chansize * 8
            );
            return Err(AudioError::UnsupportedFormat(format!(
                "MP3 needs 16-bit samples, got {}-bit",
                format.chansize * 8
            )));
        }
        if format.channels > 2 {
            return Err(AudioError::InvalidChannels {
                expected: 2,
                got: format.channels,
            });
        }
        if !SAMPLE_RATES.contains(&format.sample_rate) {
            return Err(AudioError::InvalidSampleRate {
                rate: format.sample_rate,
            });
        }

        let options = Options::parse(opts, OPTIONS)?;
        let mode = RateControl::from_options(&options)?;
        let level = options.parse_value::<u8>("quality")?.unwrap_or(0);
        let quality = quality_level(level)?;

        let lame = Self::build_engine(format, mode, quality)?;

        let framelen = frame_length(format.sample_rate);
        let bufsize = max_required_buffer_size(framelen);
        let info = match mode {
            RateControl::Constant(kbps) => {
                AudioInfo::new("mp3", format, framelen).with_bitrate(kbps * 1000)
            }
            RateControl::Variable(_) => AudioInfo::new("mp3", format, framelen).with_vbr(true),
        };

        debug!(
            "mp3 encoder: {:?}, quality {}, {} samples per frame, {} byte buffer",
            mode, level, framelen, bufsize
        );

        Ok(Mp3Encoder {
            lame,
            info,
            cursor: 0,
            bufsize,
            state: StreamState::Active,
        })
    }

    fn build_engine(
        format: &SourceFormat,
        mode: RateControl,
        quality: Quality,
    ) -> AudioResult<mp3lame_encoder::Encoder> {
        let mut builder = Builder::new()
            .ok_or_else(|| AudioError::EncodeError("Failed to create LAME builder".to_string()))?;

        builder
            .set_num_channels(format.channels as u8)
            .map_err(|e| config_error("channels", e))?;
        builder
            .set_sample_rate(format.sample_rate)
            .map_err(|e| config_error("sample rate", e))?;
        builder
            .set_quality(quality)
            .map_err(|e| config_error("quality", e))?;

        match mode {
            RateControl::Constant(kbps) => {
                builder
                    .set_vbr_mode(VbrMode::Off)
                    .map_err(|e| config_error("vbr mode", e))?;
                builder
                    .set_brate(bitrate(kbps)?)
                    .map_err(|e| config_error("bitrate", e))?;
            }
            RateControl::Variable(target) => {
                builder
                    .set_vbr_mode(VbrMode::Mtrh)
                    .map_err(|e| config_error("vbr mode", e))?;
                builder
                    .set_vbr_quality(quality_level(target)?)
                    .map_err(|e| config_error("vbr quality", e))?;
            }
        }

        builder
            .build()
            .map_err(|e| AudioError::EncodeError(format!("Failed to initialize LAME: {:?}", e)))
    }

    /// Feed one batch of interleaved samples, returning the bytes LAME emitted
    fn encode_batch(&mut self, batch: &SamplesBuffer, out: &mut Vec<u8>) -> AudioResult<usize> {
        out.clear();
        if batch.is_empty() {
            return Ok(0);
        }

        let pcm: Vec<i16> = batch
            .as_bytes()
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();

        out.reserve(self.bufsize);
        let written = if self.info.channels == 1 {
            self.lame.encode(MonoPcm(&pcm[..]), out.spare_capacity_mut())
        } else {
            self.lame.encode(InterleavedPcm(&pcm[..]), out.spare_capacity_mut())
        }
        .map_err(|e| AudioError::EncodeError(format!("LAME encode failed: {:?}", e)))?;

        // SAFETY: encode reports how many bytes of the spare capacity it initialized.
        unsafe {
            out.set_len(written);
        }
        Ok(written)
    }

    /// Encode what LAME still buffers, padded to a whole frame, and drain the reservoir
    fn flush(&mut self, out: &mut Vec<u8>) -> AudioResult<usize> {
        out.clear();
        out.reserve(self.bufsize);
        let written = self
            .lame
            .flush::<FlushGap>(out.spare_capacity_mut())
            .map_err(|e| AudioError::EncodeError(format!("LAME flush failed: {:?}", e)))?;

        // SAFETY: flush reports how many bytes of the spare capacity it initialized.
        unsafe {
            out.set_len(written);
        }
        Ok(written)
    }
}

fn config_error<E: std::fmt::Debug>(what: &str, err: E) -> AudioError {
    AudioError::ConfigError(format!("LAME rejected {}: {:?}", what, err))
}

impl AudioEncoder for Mp3Encoder {
    fn info(&self) -> &AudioInfo {
        &self.info
    }

    fn max_packet_size(&self) -> usize {
        self.bufsize
    }

    fn position(&self) -> u64 {
        self.cursor
    }

    fn encode_next(
        &mut self,
        source: &mut dyn SampleSource,
        out: &mut Vec<u8>,
    ) -> AudioResult<bool> {
        loop {
            match self.state {
                StreamState::Finished => {
                    out.clear();
                    return Ok(false);
                }
                StreamState::Failed => {
                    out.clear();
                    return Err(AudioError::SourceRead(
                        "Source failed earlier in the stream".to_string(),
                    ));
                }
                StreamState::Draining => {
                    let written = self.flush(out)?;
                    self.state = StreamState::Finished;
                    trace!("mp3 flush: {} bytes", written);
                    return Ok(written > 0);
                }
                StreamState::Active => {}
            }

            let start = self.cursor;
            let end = start.saturating_add(self.info.framelen as u64);
            let batch = match source.pull(start, end) {
                Ok(batch) => batch,
                Err(e) => {
                    out.clear();
                    self.state = StreamState::Failed;
                    return Err(match e {
                        AudioError::SourceRead(_) => e,
                        other => AudioError::SourceRead(other.to_string()),
                    });
                }
            };
            self.cursor = end;

            let written = self.encode_batch(&batch, out)?;
            trace!(
                "mp3 pull {}..{}: {} bytes in, {} bytes out",
                start,
                end,
                batch.len(),
                written
            );
            if batch.is_eof() {
                self.state = StreamState::Draining;
            }
            drop(batch);

            if written > 0 {
                return Ok(true);
            }
        }
    }

    fn skip_samples(&mut self, count: u64) {
        self.cursor = self.cursor.saturating_add(count);
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> AudioResult<bool> {
        match self.state {
            StreamState::Finished | StreamState::Failed => {
                out.clear();
                Ok(false)
            }
            StreamState::Active | StreamState::Draining => {
                let written = self.flush(out)?;
                self.state = StreamState::Finished;
                debug!("mp3 finish: {} bytes flushed", written);
                Ok(written > 0)
            }
        }
    }
}
