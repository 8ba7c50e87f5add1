//! Reduce a pitch track to a usable vocal range.
//!
//! The 10th/90th percentile of the voiced frequencies gives robust low/high
//! bounds (outlier frames from breaths and tracking glitches fall outside),
//! converted to MIDI semitones and note names. Jitter is reported as an
//! informational stability hint only.

use serde::Serialize;

use crate::error::AnalysisError;
use crate::pitch::PitchFrame;

const NOTE_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

const MIN_VOICED_FRAMES: usize = 30;
const LOW_PERCENTILE: f32 = 10.0;
const HIGH_PERCENTILE: f32 = 90.0;

#[derive(Debug, Clone, Serialize)]
pub struct VocalRange {
    pub low_midi: i32,
    pub high_midi: i32,
    pub low_name: String,
    pub high_name: String,
    pub jitter: f32,
}

/// Estimate the comfortable range from a pitch track.
pub fn estimate_range(track: &[PitchFrame]) -> Result<VocalRange, AnalysisError> {
    let voiced: Vec<f32> = track.iter().filter_map(|f| f.f0_hz).collect();

    if voiced.len() < MIN_VOICED_FRAMES {
        return Err(AnalysisError::InsufficientVoicedAudio {
            voiced: voiced.len(),
            required: MIN_VOICED_FRAMES,
        });
    }

    let mut sorted = voiced.clone();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let low_hz = percentile(&sorted, LOW_PERCENTILE);
    let high_hz = percentile(&sorted, HIGH_PERCENTILE);

    let low_midi = midi_from_hz(low_hz);
    let high_midi = midi_from_hz(high_hz);
    if high_midi <= low_midi {
        return Err(AnalysisError::DegenerateRange { low_midi, high_midi });
    }

    let jitter = median_abs_diff(&voiced);

    log::info!(
        "Estimated range {}..{} ({} - {}), jitter {:.2} Hz over {} voiced frames",
        low_midi,
        high_midi,
        note_name(low_midi),
        note_name(high_midi),
        jitter,
        voiced.len()
    );

    Ok(VocalRange {
        low_midi,
        high_midi,
        low_name: note_name(low_midi),
        high_name: note_name(high_midi),
        jitter,
    })
}

/// Percentile with linear interpolation between order statistics.
/// Input must be sorted ascending and non-empty.
pub(crate) fn percentile(sorted: &[f32], pct: f32) -> f32 {
    debug_assert!(!sorted.is_empty(), "percentile of an empty distribution");
    let rank = pct / 100.0 * (sorted.len() - 1) as f32;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let frac = rank - lo as f32;
        sorted[lo] + (sorted[hi] - sorted[lo]) * frac
    }
}

/// Median absolute frame-to-frame frequency step across voiced frames.
fn median_abs_diff(voiced: &[f32]) -> f32 {
    let mut steps: Vec<f32> = voiced.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    if steps.is_empty() {
        return 0.0;
    }
    steps.sort_by(|a, b| a.total_cmp(b));
    let mid = steps.len() / 2;
    if steps.len() % 2 == 1 {
        steps[mid]
    } else {
        (steps[mid - 1] + steps[mid]) * 0.5
    }
}

/// MIDI note number nearest to a frequency (A4 = 69 = 440 Hz).
pub fn midi_from_hz(hz: f32) -> i32 {
    (69.0 + 12.0 * (hz / 440.0).log2()).round() as i32
}

/// Equal-temperament frequency of a MIDI note.
pub fn hz_from_midi(midi: i32) -> f32 {
    440.0 * 2.0f32.powf((midi - 69) as f32 / 12.0)
}

/// Pitch-class + octave label, e.g. 60 -> "C4", 69 -> "A4".
pub fn note_name(midi: i32) -> String {
    let class = midi.rem_euclid(12) as usize;
    let octave = midi.div_euclid(12) - 1;
    format!("{}{}", NOTE_NAMES[class], octave)
}
