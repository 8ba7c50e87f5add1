mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

use cli::Cli;
use vocalmatch::pitch::TrackerConfig;
use vocalmatch::range::VocalRange;
use vocalmatch::score::{self, ScoredSong, Song};
use vocalmatch::{analysis, audio};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    low_note_midi: i32,
    high_note_midi: i32,
    low_note_name: &'a str,
    high_note_name: &'a str,
    jitter: f32,
    recommendations: &'a [ScoredSong],
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect vocalmatch.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("vocalmatch.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("vocalmatch").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("vocalmatch").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });
    if let Some(ref path) = config_path {
        if let Some(cfg) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            // Merge: config values apply only when CLI is at its default
            if cli.fmin == 65.41 { cli.fmin = cfg.analysis.fmin; }
            if cli.fmax == 1046.5 { cli.fmax = cfg.analysis.fmax; }
            if cli.top == 10 { cli.top = cfg.output.top; }
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }

    cli.validate()?;

    let input = cli.input.as_ref().context("Input audio is required")?;
    let songs_path = cli.songs.as_ref().context("Songs file is required (--songs)")?;

    log::info!("vocalmatch - vocal range analysis and song matching");
    log::info!("Input: {}", input);
    log::info!("Songs: {}", songs_path.display());
    log::info!("Search range: {:.1}-{:.1} Hz, top {}", cli.fmin, cli.fmax, cli.top);

    // 1. Load candidate songs
    let songs_json = std::fs::read_to_string(songs_path)
        .with_context(|| format!("Failed to read songs file: {}", songs_path.display()))?;
    let songs: Vec<Song> = serde_json::from_str(&songs_json)
        .with_context(|| format!("Failed to parse songs file: {}", songs_path.display()))?;
    log::info!("Loaded {} candidate songs", songs.len());

    // 2. Materialize the recording locally if it is remote
    let (audio_path, is_temp) = if audio::fetch::is_url(input) {
        (audio::fetch::fetch_to_temp(input)?, true)
    } else {
        let path = std::path::PathBuf::from(input);
        if !path.exists() {
            anyhow::bail!("Input file not found: {}", path.display());
        }
        (path, false)
    };

    // 3. Decode, then drop the temp file whether or not decoding worked
    let decoded = audio::decode::decode_audio(&audio_path);
    if is_temp {
        let _ = std::fs::remove_file(&audio_path);
    }
    let decoded = decoded?;

    // 4. Track pitch and estimate the range
    let tracker_cfg = TrackerConfig {
        fmin_hz: cli.fmin,
        fmax_hz: cli.fmax,
        ..TrackerConfig::default()
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    spinner.set_message("Analyzing recording...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let vocal_range = analysis::analyze(&decoded.samples, decoded.sample_rate, &tracker_cfg);
    spinner.finish_and_clear();
    let vocal_range = vocal_range?;

    // 5. Rank songs against the range
    let ranked = score::rank_songs(
        vocal_range.low_midi,
        vocal_range.high_midi,
        &songs,
        cli.top,
    )?;
    if let Some(best) = ranked.first() {
        log::info!("Best match: {} ({:.3})", best.song.title, best.score);
    }

    // 6. Emit the report
    let report = build_report(&vocal_range, &ranked);
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
    match cli.output {
        Some(ref path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write report: {}", path.display()))?;
            log::info!("Report written to {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn build_report<'a>(range: &'a VocalRange, ranked: &'a [ScoredSong]) -> Report<'a> {
    Report {
        low_note_midi: range.low_midi,
        high_note_midi: range.high_midi,
        low_note_name: &range.low_name,
        high_note_name: &range.high_name,
        jitter: range.jitter,
        recommendations: ranked,
    }
}
