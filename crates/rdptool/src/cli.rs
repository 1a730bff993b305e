use std::num::ParseIntError;
use std::path::PathBuf;

use bytesize::ByteSize;
use clap::{Args, Parser};

fn parse_address(value: &str) -> Result<u32, ParseIntError> {
    match value.strip_prefix("0x") {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    }
}

#[derive(Args, Debug)]
pub struct DisplayConfig {
    /// Whether content is displayed as 16:9
    #[arg(long, default_value_t = false)]
    pub widescreen: bool,
    /// Whether to remove the letterbox of widescreen content
    #[arg(long, default_value_t = false)]
    pub crop_overscan: bool,
    /// Whether to only scale by whole factors
    #[arg(long, default_value_t = false)]
    pub integer_scaling: bool,
}

/// rdptool: replays RDP command list dumps
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Path to the command list dump
    ///
    /// Dumps are sequences of big-endian 32-bit words, two per command slot.
    pub input: PathBuf,
    #[command(flatten)]
    pub display: DisplayConfig,
    /// Path to a RON file with the processor configuration
    ///
    /// Command line arguments take precedence over it.
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Size of the emulated RAM (e.g. 4MiB)
    #[arg(long)]
    pub ram_size: Option<ByteSize>,
    /// Address the list is placed at, must be 8 byte aligned
    #[arg(long, default_value_t = 0x1000, value_parser = parse_address)]
    pub address: u32,
    /// Whether to submit the list from DMEM instead of RAM
    #[arg(long, default_value_t = false)]
    pub dmem: bool,
    /// Slots submitted per END register write, zero submits the whole list at once
    #[arg(long, default_value_t = 0)]
    pub chunk: usize,
    /// Where to write a snapshot of the processor after replaying
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
    /// Path of the log file
    #[arg(long, default_value = "rdptool.log")]
    pub log: PathBuf,
}
