use anyhow::{Context, Result};
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(45);

/// Extensions the decoder's format probe understands; keeping one on the
/// temp file lets it skip content sniffing.
const KNOWN_EXTENSIONS: &[&str] = &[
    ".wav", ".mp3", ".m4a", ".aac", ".flac", ".ogg", ".opus", ".webm", ".mp4",
];

pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Download a remote audio source to a temp file and return its path.
/// The caller owns the file and removes it after decoding.
pub fn fetch_to_temp(url: &str) -> Result<PathBuf> {
    log::info!("Downloading audio from {}", url);

    let client = reqwest::blocking::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")?;

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("Audio download failed: {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Audio download failed with status {}", response.status());
    }

    let bytes = response.bytes().context("Failed to read audio download body")?;
    if bytes.is_empty() {
        anyhow::bail!("Audio download returned empty content");
    }

    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let path = std::env::temp_dir().join(format!(
        "vocalmatch-{}-{}{}",
        std::process::id(),
        stamp,
        extension_for(url)
    ));

    let mut file = std::fs::File::create(&path)
        .with_context(|| format!("Failed to create temp file: {}", path.display()))?;
    file.write_all(&bytes)
        .with_context(|| format!("Failed to write temp file: {}", path.display()))?;

    log::info!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(path)
}

fn extension_for(url: &str) -> &'static str {
    let lowered = url.to_ascii_lowercase();
    // Strip query/fragment before matching the extension.
    let path_end = lowered.find(['?', '#']).unwrap_or(lowered.len());
    let path = &lowered[..path_end];
    KNOWN_EXTENSIONS
        .iter()
        .find(|ext| path.ends_with(*ext))
        .copied()
        .unwrap_or(".audio")
}
