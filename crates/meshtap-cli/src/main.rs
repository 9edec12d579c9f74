//! Meshtastic Frame Decoder Command-Line Interface
//!
//! This CLI decodes link-layer frames that an SDR receive chain has already
//! demodulated into bytes:
//! - Decoding single frames or hex-line streams (file or stdin)
//! - Decrypting channel payloads with configured PSKs
//! - Inspecting the channel key table and its hash bytes
//!
//! Demodulation and transport are up to the capture tooling; this program
//! only ever sees hex.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use meshtap_core::{hexdump, DecodeError, FrameDecoder};
use tracing::warn;

mod config;

use config::build_keystore;

#[derive(Parser)]
#[command(name = "meshtap")]
#[command(author, version, about = "Meshtastic link-layer frame decoder", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode raw frames captured from the radio
    Decode {
        /// Frame as a hex string (whitespace allowed)
        #[arg(long)]
        hex: Option<String>,

        /// File with one hex frame per line (- for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Channel key config file (JSON)
        #[arg(short, long)]
        keys: Option<PathBuf>,

        /// Register a channel key inline (repeatable)
        #[arg(long = "channel", value_name = "NAME=PSK")]
        channels: Vec<String>,

        /// One line per frame instead of the full report
        #[arg(long)]
        summary: bool,

        /// Print each re-assembled header+payload as a hex line
        #[arg(long)]
        emit_frames: bool,

        /// Skip decryption, pass payloads through untouched
        #[arg(long)]
        no_decrypt: bool,
    },

    /// Show the channel key table with computed hash bytes
    Keys {
        /// Channel key config file (JSON)
        #[arg(short, long)]
        keys: Option<PathBuf>,

        /// Register a channel key inline (repeatable)
        #[arg(long = "channel", value_name = "NAME=PSK")]
        channels: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn cmd_decode(
    hex: Option<String>,
    input: Option<PathBuf>,
    keys: Option<PathBuf>,
    channels: Vec<String>,
    summary: bool,
    emit_frames: bool,
    no_decrypt: bool,
) -> Result<()> {
    let store = build_keystore(keys.as_deref(), &channels)?;
    if store.is_empty() && !no_decrypt {
        warn!("No channel keys configured; payloads will pass through unchanged");
    }
    let decoder = FrameDecoder::new(store).with_decrypt(!no_decrypt);

    match (hex, input) {
        (Some(text), None) => decode_hex_frame(&decoder, &text, summary, emit_frames),
        (None, Some(path)) => {
            if path.as_os_str() == "-" {
                let stdin = io::stdin();
                decode_stream(&decoder, stdin.lock(), summary, emit_frames)
            } else {
                let file =
                    File::open(&path).with_context(|| format!("Failed to open {:?}", path))?;
                decode_stream(&decoder, BufReader::new(file), summary, emit_frames)
            }
        }
        (None, None) => bail!("Provide a frame with --hex or a line stream with --input"),
        (Some(_), Some(_)) => bail!("--hex and --input are mutually exclusive"),
    }
}

/// Decode hex lines from a file or stdin, one frame per line. Blank lines
/// and `#` comments are skipped; a bad line never stops the stream.
fn decode_stream<R: BufRead>(
    decoder: &FrameDecoder,
    reader: R,
    summary: bool,
    emit_frames: bool,
) -> Result<()> {
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read input line")?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Err(e) = decode_hex_frame(decoder, line, summary, emit_frames) {
            warn!("Line {}: {}", lineno + 1, e);
        }
    }
    Ok(())
}

/// Decode one hex-encoded frame and print it.
fn decode_hex_frame(
    decoder: &FrameDecoder,
    text: &str,
    summary: bool,
    emit_frames: bool,
) -> Result<()> {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let raw = hex::decode(&cleaned).context("Invalid hex")?;

    match decoder.decode(&raw) {
        Ok(frame) => {
            if summary {
                println!("{}", frame.summary());
            } else {
                println!("{}", chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f"));
                println!("{}", frame.format_report());
                println!();
            }
            if emit_frames {
                println!("{}", hex::encode(frame.frame_bytes()));
            }
        }
        Err(DecodeError::TooShort { .. }) => {
            println!("Frame too short:");
            if !raw.is_empty() {
                println!("{}", hexdump(&raw));
            }
        }
    }

    Ok(())
}

fn cmd_keys(keys: Option<PathBuf>, channels: Vec<String>) -> Result<()> {
    let store = build_keystore(keys.as_deref(), &channels)?;
    if store.is_empty() {
        println!("No channel keys configured");
        return Ok(());
    }

    println!("{:<7} {:<20} {}", "Hash", "Channel", "Key");
    println!("{}", "-".repeat(48));
    for (hash, entry) in store.entries() {
        println!(
            "0x{:02X}    {:<20} {} bytes (AES-{})",
            hash,
            entry.name,
            entry.key.len(),
            entry.key.len() * 8
        );
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = match cli.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Decode {
            hex,
            input,
            keys,
            channels,
            summary,
            emit_frames,
            no_decrypt,
        } => cmd_decode(hex, input, keys, channels, summary, emit_frames, no_decrypt),

        Commands::Keys { keys, channels } => cmd_keys(keys, channels),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}
