use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "vocalmatch",
    about = "Estimate a singer's vocal range from a recording and rank songs that fit it"
)]
pub struct Cli {
    /// Input recording: a local file or an http(s) URL (WAV, MP3, FLAC, OGG, AAC)
    pub input: Option<String>,

    /// JSON file with the candidate songs to score
    #[arg(short, long)]
    pub songs: Option<PathBuf>,

    /// Number of recommendations to keep
    #[arg(short = 'k', long, default_value_t = 10)]
    pub top: usize,

    /// Write the JSON report to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Lower bound of the pitch search range in Hz
    #[arg(long, default_value_t = 65.41)]
    pub fmin: f32,

    /// Upper bound of the pitch search range in Hz
    #[arg(long, default_value_t = 1046.5)]
    pub fmax: f32,

    /// Config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Check cross-flag constraints clap cannot express.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !(self.fmin > 0.0) {
            anyhow::bail!("--fmin must be positive (got {})", self.fmin);
        }
        if self.fmin >= self.fmax {
            anyhow::bail!(
                "--fmin must be below --fmax (got {} >= {})",
                self.fmin,
                self.fmax
            );
        }
        Ok(())
    }
}
