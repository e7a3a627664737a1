//! Sample source decoding compressed media through Symphonia

use crate::core::{SamplesBuffer, SourceFormat};
use crate::error::{AudioError, AudioResult};
use log::{debug, trace, warn};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, Decoder, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Compressed-media source decoding to interleaved 16-bit samples
///
/// Decoding is forward only. Skipping ahead discards decoded samples; pulling a range that
/// starts before the read position fails.
pub struct DecodedSource {
    reader: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    format: SourceFormat,
    /// Decoded values not yet handed out
    pending: Vec<i16>,
    /// Sample index of `pending[0]`
    position: u64,
    finished: bool,
}

impl DecodedSource {
    /// Probe and open a media file
    pub fn open<P: AsRef<Path>>(path: P) -> AudioResult<Self> {
        let path = path.as_ref();
        let file = Box::new(File::open(path)?);
        let mss = MediaSourceStream::new(file, Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::UnsupportedFormat(e.to_string()))?;
        let reader = probed.format;

        let track = reader
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::UnsupportedFormat("No audio track found".to_string()))?
            .clone();

        let params = &track.codec_params;
        let sample_rate = params
            .sample_rate
            .ok_or_else(|| AudioError::UnsupportedFormat("Unknown sample rate".to_string()))?;
        let channels = params
            .channels
            .map(|c| c.count() as u16)
            .ok_or_else(|| AudioError::UnsupportedFormat("Unknown channel count".to_string()))?;
        let format = SourceFormat::new(sample_rate, channels, 2)?;

        let decoder = symphonia::default::get_codecs()
            .make(params, &DecoderOptions::default())
            .map_err(|e| AudioError::DecodeError(e.to_string()))?;

        debug!(
            "decoded source {}: {} Hz, {} channels",
            path.display(),
            sample_rate,
            channels
        );

        Ok(DecodedSource {
            reader,
            decoder,
            track_id: track.id,
            format,
            pending: Vec::new(),
            position: 0,
            finished: false,
        })
    }

    /// Decode one more packet into `pending`
    fn decode_next(&mut self) -> AudioResult<()> {
        loop {
            let packet = match self.reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.finished = true;
                    return Ok(());
                }
                Err(SymphoniaError::ResetRequired) => {
                    warn!("stream parameters changed mid-stream, stopping");
                    self.finished = true;
                    return Ok(());
                }
                Err(e) => return Err(AudioError::SourceRead(e.to_string())),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    // Corrupt packets are skipped
                    warn!("skipping undecodable packet: {}", e);
                    continue;
                }
                Err(e) => return Err(AudioError::SourceRead(e.to_string())),
            };

            if decoded.frames() == 0 {
                continue;
            }

            let spec = *decoded.spec();
            if spec.channels.count() != self.format.channels as usize {
                return Err(AudioError::SourceRead(format!(
                    "Channel count changed from {} to {}",
                    self.format.channels,
                    spec.channels.count()
                )));
            }

            let mut samples = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
            samples.copy_interleaved_ref(decoded);
            self.pending.extend_from_slice(samples.samples());
            return Ok(());
        }
    }

    /// Decode until `values` interleaved values are pending or the stream ends
    fn fill(&mut self, values: usize) -> AudioResult<()> {
        while self.pending.len() < values && !self.finished {
            self.decode_next()?;
        }
        Ok(())
    }
}

impl super::SampleSource for DecodedSource {
    fn format(&self) -> SourceFormat {
        self.format
    }

    fn pull(&mut self, start: u64, end: u64) -> AudioResult<SamplesBuffer> {
        if start < self.position || end < start {
            return Err(AudioError::SourceRead(format!(
                "Cannot pull {}..{} at read position {}",
                start, end, self.position
            )));
        }
        let channels = self.format.channels as usize;

        let skip = ((start - self.position) as usize).saturating_mul(channels);
        self.fill(skip)?;
        let skipped = skip.min(self.pending.len());
        self.pending.drain(..skipped);
        self.position += (skipped / channels) as u64;

        let wanted = ((end - start) as usize).saturating_mul(channels);
        // One value past the request tells whether this batch reaches the end
        self.fill(wanted.saturating_add(1))?;
        let taken = wanted.min(self.pending.len());
        let data: Vec<u8> = self
            .pending
            .drain(..taken)
            .flat_map(|s| s.to_le_bytes())
            .collect();
        self.position += (taken / channels) as u64;

        let eof = self.finished && self.pending.is_empty();
        trace!("decoded pull {}..{} delivered {} bytes", start, end, data.len());

        Ok(SamplesBuffer::new(data, eof))
    }
}
