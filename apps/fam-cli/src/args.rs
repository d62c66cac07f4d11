use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

/// Headless Famicom runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the iNES ROM file
    #[arg(required = true)]
    pub rom: PathBuf,

    /// Number of frames to emulate
    #[arg(short, long, default_value = "600")]
    pub frames: u32,

    /// Write the last drawn frame as a PNG
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Dump the sound stream as raw 8-bit unsigned mono PCM at 22080 Hz
    #[arg(long)]
    pub pcm: Option<PathBuf>,

    /// Directory for battery save files; saves stay in memory when omitted
    #[arg(long)]
    pub save_dir: Option<PathBuf>,

    /// Build this mapper instead of the one named in the header
    #[arg(long)]
    pub mapper: Option<u16>,

    /// Pad 1 buttons held for the whole run, bit 0 = A through bit 7 = Right
    #[arg(long, default_value = "0")]
    pub buttons: u8,

    /// Pace frames in real time, skipping drawing when behind
    #[arg(long)]
    pub realtime: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    pub log_level: Level,
}
