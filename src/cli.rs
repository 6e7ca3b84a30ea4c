use clap::Parser;
use std::path::PathBuf;

use crate::report::OutputMode;

#[derive(Parser, Debug)]
#[command(
    name = "gccphat",
    about = "Per-window GCC-PHAT time delay estimation between two stereo channels"
)]
pub struct Cli {
    /// Stereo input audio file (WAV, MP3, FLAC, OGG)
    pub input: PathBuf,

    /// Window length in samples (must be a power of two)
    #[arg(short, long, default_value_t = 1024)]
    pub buffer_size: usize,

    /// Lower edge of the analysis band in Hz
    #[arg(long, default_value_t = 100.0)]
    pub fmin: f64,

    /// Upper edge of the analysis band in Hz
    #[arg(long, default_value_t = 8000.0)]
    pub fmax: f64,

    /// Where results go
    #[arg(short, long, value_enum, default_value_t = OutputMode::Console)]
    pub mode: OutputMode,

    /// Output file for csv/json modes (defaults next to the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Disable PHAT weighting of the cross-power spectrum
    #[arg(long)]
    pub no_phat: bool,

    /// Phase lookup table resolution
    #[arg(long, default_value_t = 360)]
    pub lookup_points: usize,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long, default_value_t = 0)]
    pub threads: usize,

    /// Config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,
}
