//! Encoder handle binding a codec to one stream

use super::{AudioEncoder, CodecDescriptor};
use crate::core::{AudioInfo, Packet};
use crate::error::AudioResult;
use crate::source::SampleSource;
use log::{debug, warn};

/// A live encode of one sample source with one codec
///
/// The handle borrows the source for its whole lifetime and owns the codec state. Packets it
/// hands out should come back through [`EncoderHandle::free_packet`] so their buffer is reused
/// for the next one. Dropping the handle releases everything, drained or not.
pub struct EncoderHandle<'a> {
    encoder: Box<dyn AudioEncoder>,
    descriptor: &'static CodecDescriptor,
    source: &'a mut dyn SampleSource,
    /// Output buffer lent to the caller as a packet in between
    scratch: Option<Vec<u8>>,
    packets: u64,
}

impl<'a> EncoderHandle<'a> {
    /// Configure `descriptor` for `source`
    pub fn open(
        descriptor: &'static CodecDescriptor,
        source: &'a mut dyn SampleSource,
        options: &str,
    ) -> AudioResult<Self> {
        let format = source.format();
        let encoder = descriptor.init(&format, options).inspect_err(|e| {
            warn!("{} encoder rejected setup: {}", descriptor.name(), e);
        })?;
        let scratch = Vec::with_capacity(encoder.max_packet_size());

        debug!(
            "opened {} encoder: {} Hz, {} channels, {} samples per frame",
            descriptor.name(),
            format.sample_rate,
            format.channels,
            encoder.info().framelen
        );

        Ok(EncoderHandle {
            encoder,
            descriptor,
            source,
            scratch: Some(scratch),
            packets: 0,
        })
    }

    /// Stream description computed at open
    pub fn info(&self) -> &AudioInfo {
        self.encoder.info()
    }

    /// Name of the bound codec
    pub fn codec_name(&self) -> &'static str {
        self.descriptor.name()
    }

    /// Descriptor this handle was opened with
    pub fn descriptor(&self) -> &'static CodecDescriptor {
        self.descriptor
    }

    /// Next sample index the encoder will pull
    pub fn position(&self) -> u64 {
        self.encoder.position()
    }

    /// Number of packets handed out so far
    pub fn packets(&self) -> u64 {
        self.packets
    }

    /// Encode the next packet
    ///
    /// `Ok(None)` means the stream is fully drained; asking again keeps returning `Ok(None)`.
    pub fn next_packet(&mut self) -> AudioResult<Option<Packet>> {
        let mut buf = self.take_scratch();
        match self.encoder.encode_next(&mut *self.source, &mut buf) {
            Ok(true) => Ok(Some(self.hand_out(buf))),
            Ok(false) => {
                self.scratch = Some(buf);
                Ok(None)
            }
            Err(e) => {
                self.scratch = Some(buf);
                Err(e)
            }
        }
    }

    /// Skip `count` samples of input without encoding them
    pub fn skip_samples(&mut self, count: u64) {
        if count > 0 {
            debug!("skipping {} samples at {}", count, self.position());
            self.encoder.skip_samples(count);
        }
    }

    /// Flush the codec, returning whatever it still held
    ///
    /// Only [`EncoderHandle::close`] is meaningful afterwards.
    pub fn finish(&mut self) -> AudioResult<Option<Packet>> {
        let mut buf = self.take_scratch();
        match self.encoder.finish(&mut buf) {
            Ok(true) => Ok(Some(self.hand_out(buf))),
            Ok(false) => {
                self.scratch = Some(buf);
                Ok(None)
            }
            Err(e) => {
                self.scratch = Some(buf);
                Err(e)
            }
        }
    }

    /// Give a packet back for its buffer to be reused
    pub fn free_packet(&mut self, packet: Packet) {
        let mut buf = packet.into_bytes();
        buf.clear();
        self.scratch = Some(buf);
    }

    /// Release the codec and the handle
    pub fn close(self) {
        debug!(
            "closing {} encoder after {} packets",
            self.descriptor.name(),
            self.packets
        );
    }

    fn take_scratch(&mut self) -> Vec<u8> {
        self.scratch
            .take()
            .unwrap_or_else(|| Vec::with_capacity(self.encoder.max_packet_size()))
    }

    fn hand_out(&mut self, buf: Vec<u8>) -> Packet {
        self.packets += 1;
        Packet::new(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{SamplesBuffer, SourceFormat};
    use crate::encoder::{RAW, select_encoder};
    use crate::error::AudioError;
    use crate::source::MemorySource;

    /// Source that fails on its nth pull
    struct FailingSource {
        format: SourceFormat,
        fail_at: u64,
        pulls: u64,
    }

    impl SampleSource for FailingSource {
        fn format(&self) -> SourceFormat {
            self.format
        }

        fn pull(&mut self, start: u64, end: u64) -> AudioResult<SamplesBuffer> {
            self.pulls += 1;
            if self.pulls >= self.fail_at {
                return Err(AudioError::Io(std::io::Error::other("disk gone")));
            }
            let len = (end - start) as usize * self.format.samplesize();
            Ok(SamplesBuffer::new(vec![0; len], false))
        }
    }

    fn ramp(frames: usize) -> MemorySource {
        let samples: Vec<i16> = (0..frames * 2).map(|i| (i % 997) as i16).collect();
        MemorySource::from_i16(&samples, 48000, 2).unwrap()
    }

    fn drain(handle: &mut EncoderHandle) -> Vec<Vec<u8>> {
        let mut packets = Vec::new();
        while let Some(packet) = handle.next_packet().unwrap() {
            packets.push(packet.as_bytes().to_vec());
            handle.free_packet(packet);
        }
        if let Some(packet) = handle.finish().unwrap() {
            packets.push(packet.as_bytes().to_vec());
            handle.free_packet(packet);
        }
        packets
    }

    #[test]
    fn test_open_then_close() {
        let mut source = ramp(100);
        let handle = EncoderHandle::open(&RAW, &mut source, "").unwrap();
        assert_eq!(handle.codec_name(), "raw");
        handle.close();
        assert_eq!(source.pulls(), 0);
    }

    #[test]
    fn test_info_matches_source() {
        let mut source = ramp(10);
        let handle = EncoderHandle::open(&RAW, &mut source, "framelen=5").unwrap();
        let info = handle.info();
        assert_eq!(info.sample_rate, 48000);
        assert_eq!(info.channels, 2);
        assert_eq!(info.chansize, 2);
        assert_eq!(info.framelen, 5);
    }

    #[test]
    fn test_pull_count_is_ceiling() {
        for (total, framelen) in [(10usize, 5u64), (11, 5), (4, 5), (1, 1)] {
            let mut source = ramp(total);
            let opts = format!("framelen={}", framelen);
            let mut handle = EncoderHandle::open(&RAW, &mut source, &opts).unwrap();
            let packets = drain(&mut handle);

            let expected = (total as u64).div_ceil(framelen);
            assert_eq!(packets.len() as u64, expected);
            assert!(handle.position() <= total as u64 + framelen);
            assert_eq!(handle.packets(), expected);
            drop(handle);
            assert_eq!(source.pulls(), expected);
        }
    }

    #[test]
    fn test_skip_zero_is_identity() {
        let mut plain_source = ramp(50);
        let mut plain = EncoderHandle::open(&RAW, &mut plain_source, "framelen=8").unwrap();
        let expected = drain(&mut plain);

        let mut skipped_source = ramp(50);
        let mut skipped = EncoderHandle::open(&RAW, &mut skipped_source, "framelen=8").unwrap();
        skipped.skip_samples(0);
        assert_eq!(drain(&mut skipped), expected);
    }

    #[test]
    fn test_skip_drops_leading_samples() {
        let mut source = ramp(20);
        let mut handle = EncoderHandle::open(&RAW, &mut source, "framelen=8").unwrap();
        handle.skip_samples(16);

        let packet = handle.next_packet().unwrap().unwrap();
        assert_eq!(packet.len(), 4 * 4);
        handle.free_packet(packet);
        assert!(handle.next_packet().unwrap().is_none());
    }

    #[test]
    fn test_terminal_none_is_stable() {
        let mut source = ramp(3);
        let mut handle = EncoderHandle::open(&RAW, &mut source, "").unwrap();
        drain(&mut handle);
        for _ in 0..3 {
            assert!(handle.next_packet().unwrap().is_none());
        }
        assert!(handle.finish().unwrap().is_none());
    }

    #[test]
    fn test_scratch_buffer_reused() {
        let mut source = ramp(64);
        let mut handle = EncoderHandle::open(&RAW, &mut source, "framelen=16").unwrap();

        let first = handle.next_packet().unwrap().unwrap();
        let ptr = first.as_bytes().as_ptr();
        handle.free_packet(first);

        let second = handle.next_packet().unwrap().unwrap();
        assert_eq!(second.as_bytes().as_ptr(), ptr);
    }

    #[test]
    fn test_source_error_surfaces() {
        let mut source = FailingSource {
            format: SourceFormat::new(44100, 2, 2).unwrap(),
            fail_at: 2,
            pulls: 0,
        };
        let mut handle = EncoderHandle::open(&RAW, &mut source, "framelen=4").unwrap();

        assert!(handle.next_packet().unwrap().is_some());
        assert!(matches!(
            handle.next_packet(),
            Err(AudioError::SourceRead(_))
        ));
    }

    #[test]
    fn test_bad_options_leave_no_handle() {
        let mut source = ramp(10);
        assert!(matches!(
            EncoderHandle::open(&RAW, &mut source, "bogus=1"),
            Err(AudioError::ConfigError(_))
        ));
        // The source is usable again right away
        assert_eq!(source.pulls(), 0);
    }

    #[test]
    fn test_open_selected_encoder() {
        let descriptor = select_encoder("auto", Some(&["flac", "raw"][..])).unwrap();
        let mut source = ramp(10);
        let handle = EncoderHandle::open(descriptor, &mut source, "").unwrap();
        assert_eq!(handle.descriptor(), &RAW);
    }

    #[cfg(feature = "mp3")]
    mod mp3 {
        use super::*;
        use crate::encoder::MP3;

        fn sine(frames: usize, channels: u16) -> MemorySource {
            let samples: Vec<i16> = (0..frames * channels as usize)
                .map(|i| ((i as f32 * 0.031).sin() * 12000.0) as i16)
                .collect();
            MemorySource::from_i16(&samples, 48000, channels).unwrap()
        }

        #[test]
        fn test_open_then_close() {
            let mut source = sine(100, 2);
            let handle = EncoderHandle::open(&MP3, &mut source, "bitrate=192").unwrap();
            handle.close();
        }

        #[test]
        fn test_cbr_with_vbr_fails() {
            let mut source = sine(100, 2);
            let result = EncoderHandle::open(&MP3, &mut source, "bitrate=192,vbr=2");
            assert!(result.err().unwrap().is_configuration());
        }

        #[test]
        fn test_full_stream() {
            let total = 48000;
            let mut source = sine(total, 2);
            let mut handle = EncoderHandle::open(&MP3, &mut source, "vbr=2").unwrap();
            let framelen = handle.info().framelen as u64;

            let packets = drain(&mut handle);
            assert!(!packets.is_empty());
            assert!(packets.iter().all(|p| !p.is_empty()));
            assert!(handle.position() < total as u64 + framelen);
            assert!(handle.next_packet().unwrap().is_none());

            drop(handle);
            assert_eq!(source.pulls(), (total as u64).div_ceil(framelen));
        }

        #[test]
        fn test_skip_zero_is_identity() {
            let mut a = sine(5000, 1);
            let mut plain = EncoderHandle::open(&MP3, &mut a, "bitrate=96").unwrap();
            let expected = drain(&mut plain);

            let mut b = sine(5000, 1);
            let mut skipped = EncoderHandle::open(&MP3, &mut b, "bitrate=96").unwrap();
            skipped.skip_samples(0);
            assert_eq!(drain(&mut skipped), expected);
        }

        #[test]
        fn test_source_failure_is_sticky() {
            let mut source = FailingSource {
                format: SourceFormat::new(44100, 2, 2).unwrap(),
                fail_at: 4,
                pulls: 0,
            };
            let mut handle = EncoderHandle::open(&MP3, &mut source, "bitrate=128").unwrap();

            let err = loop {
                match handle.next_packet() {
                    Ok(Some(packet)) => handle.free_packet(packet),
                    Ok(None) => panic!("stream ended instead of failing"),
                    Err(e) => break e,
                }
            };
            assert!(matches!(err, AudioError::SourceRead(_)));
            let failed_at = handle.position();

            for _ in 0..2 {
                assert!(matches!(
                    handle.next_packet(),
                    Err(AudioError::SourceRead(_))
                ));
            }
            assert!(handle.finish().unwrap().is_none());
            assert!(matches!(
                handle.next_packet(),
                Err(AudioError::SourceRead(_))
            ));
            assert_eq!(handle.position(), failed_at);
            drop(handle);
            assert_eq!(source.pulls, 4);
        }

        #[test]
        fn test_close_without_draining() {
            let mut source = sine(20_000, 2);
            let mut handle = EncoderHandle::open(&MP3, &mut source, "bitrate=128").unwrap();
            let packet = handle.next_packet().unwrap();
            assert!(packet.is_some());
            handle.close();
        }
    }
}
