//! Pipeline entry: validate the buffer, track pitch, reduce to a range.

use crate::error::AnalysisError;
use crate::pitch::{self, TrackerConfig};
use crate::range::{self, VocalRange};

/// Minimum usable recording length. Anything shorter cannot produce the 30
/// voiced frames the estimator needs anyway, so fail fast with a clearer
/// message.
pub const MIN_DURATION_SECS: f32 = 2.0;

pub fn analyze(
    samples: &[f32],
    sample_rate: u32,
    cfg: &TrackerConfig,
) -> Result<VocalRange, AnalysisError> {
    let seconds = samples.len() as f32 / sample_rate as f32;
    if seconds < MIN_DURATION_SECS {
        return Err(AnalysisError::AudioTooShort {
            seconds,
            min_seconds: MIN_DURATION_SECS,
        });
    }

    let track = pitch::track(samples, sample_rate, cfg);
    let voiced = track.iter().filter(|f| f.f0_hz.is_some()).count();
    log::info!("Pitch track: {} frames, {} voiced", track.len(), voiced);

    range::estimate_range(&track)
}
