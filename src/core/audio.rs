use crate::error::{AudioError, AudioResult};

/// Largest container we accept from a source, in bytes per channel sample
const MAX_CHANSIZE: u16 = 8;

/// Layout of the raw samples a source delivers
///
/// Samples are interleaved by channel, little-endian, `chansize` bytes each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormat {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of interleaved channels
    pub channels: u16,
    /// Bytes per channel sample (2 for 16-bit containers)
    pub chansize: u16,
}

impl SourceFormat {
    /// Create a validated source format
    pub fn new(sample_rate: u32, channels: u16, chansize: u16) -> AudioResult<Self> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidSampleRate { rate: sample_rate });
        }
        if channels == 0 {
            return Err(AudioError::ConfigError("Source has no channels".to_string()));
        }
        if chansize == 0 || chansize > MAX_CHANSIZE {
            return Err(AudioError::UnsupportedFormat(format!(
                "{} bytes per sample",
                chansize
            )));
        }

        Ok(SourceFormat {
            sample_rate,
            channels,
            chansize,
        })
    }

    /// Bytes per multichannel sample
    pub fn samplesize(&self) -> usize {
        self.channels as usize * self.chansize as usize
    }
}

/// Description of the stream an encoder produces
///
/// Built once while the encoder is opened and read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioInfo {
    /// Codec name as registered (e.g. "mp3")
    pub codec_name: &'static str,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Bytes per channel sample of the input
    pub chansize: u16,
    /// Bytes per multichannel input sample
    pub samplesize: usize,
    /// Samples consumed per codec frame
    pub framelen: usize,
    /// Bytes of raw input per codec frame
    pub framesize: usize,
    /// Nominal bitrate in bits per second, if known
    pub bitrate: Option<u32>,
    /// Whether the bitrate varies
    pub is_vbr: bool,
    /// Out-of-band codec parameters a muxer may need
    pub extradata: Option<Vec<u8>>,
}

impl AudioInfo {
    /// Derive encoder info from the source layout and the codec frame length
    pub fn new(codec_name: &'static str, format: &SourceFormat, framelen: usize) -> Self {
        let samplesize = format.samplesize();
        AudioInfo {
            codec_name,
            sample_rate: format.sample_rate,
            channels: format.channels,
            chansize: format.chansize,
            samplesize,
            framelen,
            framesize: framelen * samplesize,
            bitrate: None,
            is_vbr: false,
            extradata: None,
        }
    }

    /// Set the nominal bitrate
    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Mark the stream as variable bitrate
    pub fn with_vbr(mut self, is_vbr: bool) -> Self {
        self.is_vbr = is_vbr;
        self
    }

    /// Length of the extradata, 0 when absent
    pub fn extradata_size(&self) -> usize {
        self.extradata.as_ref().map(|e| e.len()).unwrap_or(0)
    }

    /// Get bitrate in kbps
    pub fn bitrate_kbps(&self) -> Option<u32> {
        self.bitrate.map(|b| b / 1000)
    }
}

/// Raw samples pulled from a source for one encode step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplesBuffer {
    data: Vec<u8>,
    eof: bool,
}

impl SamplesBuffer {
    /// Wrap interleaved sample bytes
    pub fn new(data: Vec<u8>, eof: bool) -> Self {
        SamplesBuffer { data, eof }
    }

    /// An empty batch marking the end of the stream
    pub fn end_of_stream() -> Self {
        SamplesBuffer {
            data: Vec::new(),
            eof: true,
        }
    }

    /// Raw sample bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the batch carries no samples
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Whether the source has no samples past this batch
    pub fn is_eof(&self) -> bool {
        self.eof
    }

}

/// One encoded audio packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    data: Vec<u8>,
}

impl Packet {
    /// Wrap encoded bytes
    pub fn new(data: Vec<u8>) -> Self {
        Packet { data }
    }

    /// Encoded bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if packet is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Take the bytes out of the packet
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_format_validation() {
        assert!(SourceFormat::new(44100, 2, 2).is_ok());
        assert!(SourceFormat::new(0, 2, 2).is_err());
        assert!(SourceFormat::new(44100, 0, 2).is_err());
        assert!(matches!(
            SourceFormat::new(44100, 2, 0),
            Err(AudioError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_samplesize() {
        let format = SourceFormat::new(48000, 2, 3).unwrap();
        assert_eq!(format.samplesize(), 6);
    }

    #[test]
    fn test_audio_info_geometry() {
        let format = SourceFormat::new(44100, 2, 2).unwrap();
        let info = AudioInfo::new("mp3", &format, 1152).with_bitrate(192_000);

        assert_eq!(info.samplesize, 4);
        assert_eq!(info.framesize, 4608);
        assert_eq!(info.bitrate_kbps(), Some(192));
        assert_eq!(info.extradata_size(), 0);
        assert!(!info.is_vbr);
    }

    #[test]
    fn test_samples_buffer_counts() {
        let buf = SamplesBuffer::new(vec![0; 10], false);
        assert_eq!(buf.len(), 10);
        assert!(!buf.is_eof());

        let end = SamplesBuffer::end_of_stream();
        assert!(end.is_eof());
        assert!(end.is_empty());
    }
}
