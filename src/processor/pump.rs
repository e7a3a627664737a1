//! Packet pump writing an encoded stream to a sink

use super::ProcessingStats;
use crate::encoder::EncoderHandle;
use crate::error::AudioResult;
use log::{debug, info};
use std::io::Write;

/// Drive an encoder to the end of its stream, writing packets to a sink
///
/// Packets are written verbatim, one after another. The handle is flushed with `finish`
/// once `next_packet` runs dry.
pub struct PacketPump<W: Write> {
    sink: W,
    stats: ProcessingStats,
}

impl<W: Write> PacketPump<W> {
    /// Create a pump writing into `sink`
    pub fn new(sink: W) -> Self {
        PacketPump {
            sink,
            stats: ProcessingStats::default(),
        }
    }

    /// Encode everything `handle` produces
    pub fn run(&mut self, handle: &mut EncoderHandle) -> AudioResult<&ProcessingStats> {
        let start = handle.position();

        while let Some(packet) = handle.next_packet()? {
            self.sink.write_all(packet.as_bytes())?;
            self.stats.packets += 1;
            self.stats.bytes += packet.len() as u64;
            handle.free_packet(packet);
        }

        if let Some(packet) = handle.finish()? {
            debug!("final flush: {} bytes", packet.len());
            self.sink.write_all(packet.as_bytes())?;
            self.stats.packets += 1;
            self.stats.bytes += packet.len() as u64;
            handle.free_packet(packet);
        }

        self.sink.flush()?;
        self.stats.samples += handle.position() - start;

        info!(
            "{}: {} packets, {} bytes",
            handle.codec_name(),
            self.stats.packets,
            self.stats.bytes
        );
        Ok(&self.stats)
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Give back the sink
    pub fn into_inner(self) -> W {
        self.sink
    }
}
