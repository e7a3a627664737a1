//! audenc command line interface
//!
//! Encodes an audio file with any registered encoder and writes the raw packet stream.

use audenc::encoder::{self, EncoderHandle};
use audenc::processor::PacketPump;
use audenc::source::{self, SampleSource};
use clap::{Parser, Subcommand};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "audenc")]
#[command(about = "Pluggable audio encoders - encode audio into raw packet streams", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered encoders
    Encoders,

    /// Show the sample layout of an input file
    Probe {
        /// Input audio file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Encode an input file into a raw packet stream
    Encode {
        /// Input audio file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Encoder name, or "auto" for the first allowed one
        #[arg(short, long, default_value = "auto")]
        codec: String,

        /// Comma separated encoders eligible for selection
        #[arg(short, long, value_delimiter = ',', default_value = "mp3,raw")]
        allow: Vec<String>,

        /// Encoder options, e.g. "bitrate=192" or "vbr=2,quality=5"
        #[arg(long, default_value = "")]
        opts: String,

        /// Leading samples to drop before encoding
        #[arg(long, default_value_t = 0)]
        skip: u64,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    info!("audenc {}", audenc::VERSION);

    match cli.command {
        Commands::Encoders => {
            for descriptor in encoder::registered() {
                let mut keys: Vec<&str> = encoder::COMMON_OPTIONS.to_vec();
                keys.extend(
                    descriptor
                        .options()
                        .iter()
                        .filter(|k| !encoder::COMMON_OPTIONS.contains(*k)),
                );
                println!("{:<6} options: {}", descriptor.name(), keys.join(", "));
            }
        }
        Commands::Probe { input } => {
            let source = source::from_file(&input)?;
            let format = source.format();
            println!("Input: {}", input.display());
            println!("  Sample rate: {} Hz", format.sample_rate);
            println!("  Channels: {}", format.channels);
            println!("  Bits per sample: {}", format.chansize * 8);
        }
        Commands::Encode {
            input,
            output,
            codec,
            allow,
            opts,
            skip,
        } => {
            let allowed: Vec<&str> = allow.iter().map(String::as_str).collect();
            let descriptor = encoder::select_encoder(&codec, Some(allowed.as_slice()))?;

            let mut source = source::from_file(&input)?;
            let mut handle = EncoderHandle::open(descriptor, source.as_mut(), &opts)?;
            let info = handle.info().clone();
            println!(
                "Encoding {} -> {} with {} ({} Hz, {} channels, {} samples per frame)",
                input.display(),
                output.display(),
                info.codec_name,
                info.sample_rate,
                info.channels,
                info.framelen
            );

            if let Some(kbps) = info.bitrate_kbps() {
                println!("  Nominal bitrate: {} kbps", kbps);
            }
            if info.extradata_size() > 0 {
                println!("  Extradata: {} bytes", info.extradata_size());
            }

            handle.skip_samples(skip);
            let mut pump = PacketPump::new(BufWriter::new(File::create(&output)?));
            let stats = pump.run(&mut handle)?.clone();
            handle.close();

            println!(
                "Wrote {} packets, {} bytes ({} samples)",
                stats.packets, stats.bytes, stats.samples
            );
        }
    }

    Ok(())
}
