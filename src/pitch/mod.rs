//! Probabilistic YIN-family pitch tracker.
//!
//! Stage 1 extracts per-frame (frequency, probability) candidates from the
//! CMNDF using a Beta-prior threshold grid; stage 2 runs a Viterbi pass over
//! pitch-bin/voicing states to pick a smooth f0 path. Stage 1 is
//! embarrassingly parallel and runs across frames with rayon.

mod viterbi;
mod yin;

use rayon::prelude::*;

pub use viterbi::PitchModel;
use viterbi::Observation;

/// Threshold grid step for stage-1 candidate extraction.
const THRESHOLD_STEP: f32 = 0.02;
const THRESHOLD_COUNT: usize = 50;
/// Weight of the global-minimum fallback when no dip clears a threshold.
const ABSOLUTE_MIN_WEIGHT: f32 = 0.01;
/// Beta(2, 18) prior over thresholds, mean 0.1.
const BETA_ALPHA: f32 = 2.0;
const BETA_BETA: f32 = 18.0;

#[derive(Debug, Clone, Copy)]
pub struct TrackerConfig {
    pub frame_size: usize,
    pub hop_size: usize,
    pub fmin_hz: f32,
    pub fmax_hz: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        // 2048 samples cover two C2 periods well past 16 kHz rates; hop is a
        // quarter window.
        Self {
            frame_size: 2048,
            hop_size: 512,
            fmin_hz: 65.41,  // C2
            fmax_hz: 1046.5, // C6
        }
    }
}

/// One analysis frame of the pitch track. `f0_hz` is None for unvoiced
/// frames; `voicing` is the probability mass behind the voiced decision.
#[derive(Debug, Clone, Copy)]
pub struct PitchFrame {
    pub f0_hz: Option<f32>,
    pub voicing: f32,
}

/// Track f0 over the whole buffer at a fixed hop.
///
/// A buffer shorter than one window produces an empty track; callers are
/// expected to reject such input before getting here.
pub fn track(samples: &[f32], sample_rate: u32, cfg: &TrackerConfig) -> Vec<PitchFrame> {
    let frame_count = if samples.len() >= cfg.frame_size {
        (samples.len() - cfg.frame_size) / cfg.hop_size + 1
    } else {
        0
    };
    if frame_count == 0 {
        return Vec::new();
    }

    let priors = threshold_priors();

    log::debug!(
        "Tracking pitch: {} frames, window {}, hop {}, {:.1}-{:.1} Hz",
        frame_count,
        cfg.frame_size,
        cfg.hop_size,
        cfg.fmin_hz,
        cfg.fmax_hz
    );

    let candidates: Vec<Vec<(f32, f32)>> = (0..frame_count)
        .into_par_iter()
        .map(|i| {
            let start = i * cfg.hop_size;
            frame_candidates(&samples[start..start + cfg.frame_size], sample_rate, cfg, &priors)
        })
        .collect();

    let model = PitchModel::new(cfg.fmin_hz, cfg.fmax_hz);
    let observations: Vec<Observation> = candidates
        .iter()
        .map(|c| Observation::from_candidates(&model, c))
        .collect();
    let path = viterbi::decode(&model, &observations);

    path.into_iter()
        .zip(observations.iter())
        .zip(candidates.iter())
        .map(|((bin, obs), cands)| match bin {
            Some(bin) => PitchFrame {
                f0_hz: Some(refined_frequency(&model, bin, cands)),
                voicing: obs.voiced[bin].min(1.0),
            },
            None => PitchFrame {
                f0_hz: None,
                voicing: obs.total,
            },
        })
        .collect()
}

/// Stage 1 for a single frame: probabilistic thresholding of the CMNDF.
fn frame_candidates(
    frame: &[f32],
    sample_rate: u32,
    cfg: &TrackerConfig,
    priors: &[f32],
) -> Vec<(f32, f32)> {
    let max_lag = ((sample_rate as f32 / cfg.fmin_hz) as usize).min(frame.len() - 1);
    let min_lag = ((sample_rate as f32 / cfg.fmax_hz).ceil() as usize).max(2).min(max_lag);

    let cmnd = yin::cmndf(&yin::difference(frame, max_lag));
    let dips = yin::local_dips(&cmnd, min_lag, max_lag);

    let global_min = (min_lag..=max_lag)
        .min_by(|&a, &b| cmnd[a].total_cmp(&cmnd[b]))
        .unwrap_or(min_lag);

    // For each threshold, the first dip below it wins outright; otherwise the
    // global minimum collects a small fallback weight.
    let mut mass: Vec<(usize, f32)> = Vec::new();
    for (i, &prior) in priors.iter().enumerate() {
        let threshold = (i + 1) as f32 * THRESHOLD_STEP;
        let picked = dips.iter().copied().find(|&lag| cmnd[lag] < threshold);
        let (lag, weight) = match picked {
            Some(lag) => (lag, prior),
            None => (global_min, prior * ABSOLUTE_MIN_WEIGHT),
        };
        match mass.iter_mut().find(|(l, _)| *l == lag) {
            Some(entry) => entry.1 += weight,
            None => mass.push((lag, weight)),
        }
    }

    mass.into_iter()
        .map(|(lag, prob)| {
            let refined = yin::refine_lag(&cmnd, lag).max(1.0);
            (sample_rate as f32 / refined, prob)
        })
        .collect()
}

/// Pull the f0 back off the bin grid: prefer the stage-1 candidate closest to
/// the winning bin (sub-bin precision), fall back to the bin center.
fn refined_frequency(model: &PitchModel, bin: usize, candidates: &[(f32, f32)]) -> f32 {
    let center = model.bin_freqs[bin];
    candidates
        .iter()
        .map(|&(freq, _)| (freq, 1200.0 * (freq / center).log2().abs()))
        .filter(|&(_, cents)| cents <= 50.0)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(freq, _)| freq)
        .unwrap_or(center)
}

fn threshold_priors() -> Vec<f32> {
    let mut weights: Vec<f32> = (0..THRESHOLD_COUNT)
        .map(|i| {
            let s = (i + 1) as f32 * THRESHOLD_STEP;
            if s >= 1.0 {
                0.0
            } else {
                s.powf(BETA_ALPHA - 1.0) * (1.0 - s).powf(BETA_BETA - 1.0)
            }
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    if sum > 0.0 {
        for w in weights.iter_mut() {
            *w /= sum;
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, secs: f32) -> Vec<f32> {
        let len = (secs * sample_rate as f32) as usize;
        (0..len)
            .map(|i| {
                (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin()
            })
            .collect()
    }

    #[test]
    fn frame_count_is_deterministic() {
        let cfg = TrackerConfig::default();
        let samples = vec![0.0f32; 2048 + 512 * 9];
        assert_eq!(track(&samples, 22050, &cfg).len(), 10);
    }

    #[test]
    fn short_buffer_yields_empty_track() {
        let cfg = TrackerConfig::default();
        assert!(track(&vec![0.0f32; 1000], 22050, &cfg).is_empty());
    }

    #[test]
    fn pure_sine_is_tracked_within_one_percent() {
        let cfg = TrackerConfig::default();
        let target = 220.0;
        let frames = track(&sine(target, 22050, 2.0), 22050, &cfg);
        assert!(!frames.is_empty());
        let close = frames
            .iter()
            .filter(|f| {
                f.f0_hz
                    .map(|hz| (hz - target).abs() / target < 0.01)
                    .unwrap_or(false)
            })
            .count();
        assert!(
            close * 2 > frames.len(),
            "only {close}/{} frames within 1% of {target} Hz",
            frames.len()
        );
    }

    #[test]
    fn silence_is_unvoiced() {
        let cfg = TrackerConfig::default();
        let frames = track(&vec![0.0f32; 22050 * 2], 22050, &cfg);
        assert!(!frames.is_empty());
        assert!(frames.iter().all(|f| f.f0_hz.is_none()));
        assert!(frames.iter().all(|f| f.voicing < 0.5));
    }

    #[test]
    fn dc_offset_buffer_is_unvoiced() {
        // Constant nonzero samples (mic bias, padded silence) carry no pitch.
        let cfg = TrackerConfig::default();
        let frames = track(&vec![0.75f32; 22050 * 3], 22050, &cfg);
        assert!(!frames.is_empty());
        let voiced = frames.iter().filter(|f| f.f0_hz.is_some()).count();
        assert_eq!(voiced, 0, "{voiced}/{} frames voiced on a DC buffer", frames.len());
        assert!(frames.iter().all(|f| f.voicing < 0.5));
    }

    #[test]
    fn priors_sum_to_one_and_favor_low_thresholds() {
        let priors = threshold_priors();
        let sum: f32 = priors.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        // Beta(2, 18) has its mode near 0.06.
        let peak = priors
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| (i + 1) as f32 * THRESHOLD_STEP)
            .unwrap();
        assert!(peak < 0.2);
    }
}
