//! HMM smoothing of the per-frame pitch candidates.
//!
//! States are log-spaced pitch bins doubled by a voicing flag. The pitch
//! transition prior is triangular and limited to a maximum per-frame jump,
//! which is what suppresses the octave errors a per-frame YIN picker makes;
//! voicing transitions are sticky.

const BIN_CENTS: f32 = 10.0;
const MAX_JUMP_BINS: i32 = 24;
const VOICING_STAY: f32 = 0.99;
const LOG_FLOOR: f32 = 1e-10;

pub struct PitchModel {
    pub bin_freqs: Vec<f32>,
    fmin_hz: f32,
    log_jump: Vec<f32>,
    log_stay: f32,
    log_switch: f32,
}

impl PitchModel {
    pub fn new(fmin_hz: f32, fmax_hz: f32) -> Self {
        let span_cents = 1200.0 * (fmax_hz / fmin_hz).log2();
        let bins = (span_cents / BIN_CENTS).ceil() as usize + 1;
        let bin_freqs = (0..bins)
            .map(|i| fmin_hz * 2.0f32.powf(i as f32 * BIN_CENTS / 1200.0))
            .collect();
        Self {
            bin_freqs,
            fmin_hz,
            log_jump: triangular_log_weights(MAX_JUMP_BINS),
            log_stay: VOICING_STAY.ln(),
            log_switch: (1.0 - VOICING_STAY).ln(),
        }
    }

    pub fn bins(&self) -> usize {
        self.bin_freqs.len()
    }

    /// Nearest bin for a frequency, or None when it falls outside the model.
    pub fn bin_for(&self, freq_hz: f32) -> Option<usize> {
        if freq_hz <= 0.0 {
            return None;
        }
        let cents = 1200.0 * (freq_hz / self.fmin_hz).log2();
        let bin = (cents / BIN_CENTS).round();
        if bin >= 0.0 && (bin as usize) < self.bin_freqs.len() {
            Some(bin as usize)
        } else {
            None
        }
    }
}

/// Per-frame observation: candidate probability mass folded onto the bins.
pub struct Observation {
    pub voiced: Vec<f32>,
    pub total: f32,
}

impl Observation {
    pub fn from_candidates(model: &PitchModel, candidates: &[(f32, f32)]) -> Self {
        let mut voiced = vec![0.0f32; model.bins()];
        for &(freq, prob) in candidates {
            if let Some(bin) = model.bin_for(freq) {
                voiced[bin] += prob;
            }
        }
        // Accumulated mass can creep past 1; the remainder is unvoiced mass.
        let total = voiced.iter().sum::<f32>().min(1.0);
        Self { voiced, total }
    }
}

/// Most probable state path. `Some(bin)` for voiced frames, `None` otherwise.
pub fn decode(model: &PitchModel, frames: &[Observation]) -> Vec<Option<usize>> {
    if frames.is_empty() {
        return Vec::new();
    }
    let bins = model.bins();
    let states = bins * 2; // [0, bins) voiced, [bins, 2*bins) unvoiced

    let mut scores = vec![f32::NEG_INFINITY; states];
    let mut backptr: Vec<Vec<u32>> = Vec::with_capacity(frames.len());

    let log_init = (1.0 / states as f32).ln();
    for (state, slot) in scores.iter_mut().enumerate() {
        *slot = log_init + obs_log(&frames[0], state, bins);
    }
    backptr.push(vec![0; states]);

    for obs in &frames[1..] {
        let mut next = vec![f32::NEG_INFINITY; states];
        let mut back = vec![0u32; states];

        for to_bin in 0..bins {
            let lo = to_bin.saturating_sub(MAX_JUMP_BINS as usize);
            let hi = (to_bin + MAX_JUMP_BINS as usize).min(bins - 1);

            for to_voiced in [true, false] {
                let to_state = if to_voiced { to_bin } else { bins + to_bin };
                let mut best = f32::NEG_INFINITY;
                let mut best_from = 0usize;

                for from_bin in lo..=hi {
                    let delta = to_bin as i32 - from_bin as i32;
                    let jump = model.log_jump[(delta + MAX_JUMP_BINS) as usize];
                    for from_voiced in [true, false] {
                        let from_state = if from_voiced { from_bin } else { bins + from_bin };
                        let voicing = if from_voiced == to_voiced {
                            model.log_stay
                        } else {
                            model.log_switch
                        };
                        let score = scores[from_state] + jump + voicing;
                        if score > best {
                            best = score;
                            best_from = from_state;
                        }
                    }
                }

                next[to_state] = best + obs_log(obs, to_state, bins);
                back[to_state] = best_from as u32;
            }
        }

        scores = next;
        backptr.push(back);
    }

    let (mut state, _) = scores
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .unwrap_or((bins, &0.0)); // bins == unvoiced state 0, unreachable fallback

    let mut path = vec![state; frames.len()];
    for t in (1..frames.len()).rev() {
        state = backptr[t][state] as usize;
        path[t - 1] = state;
    }

    path.into_iter()
        .map(|s| if s < bins { Some(s) } else { None })
        .collect()
}

fn obs_log(obs: &Observation, state: usize, bins: usize) -> f32 {
    let p = if state < bins {
        obs.voiced[state]
    } else {
        1.0 - obs.total
    };
    p.max(LOG_FLOOR).ln()
}

fn triangular_log_weights(max_jump: i32) -> Vec<f32> {
    let raw: Vec<f32> = (-max_jump..=max_jump)
        .map(|d| (max_jump + 1 - d.abs()) as f32)
        .collect();
    let sum: f32 = raw.iter().sum();
    raw.into_iter().map(|w| (w / sum).ln()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_candidate(model: &PitchModel, freq: f32, prob: f32) -> Observation {
        Observation::from_candidates(model, &[(freq, prob)])
    }

    #[test]
    fn bin_mapping_round_trips_within_half_a_bin() {
        let model = PitchModel::new(65.41, 1046.5);
        for &freq in &[65.41f32, 110.0, 220.0, 440.0, 1000.0] {
            let bin = model.bin_for(freq).unwrap();
            let center = model.bin_freqs[bin];
            let cents_off = 1200.0 * (freq / center).log2().abs();
            assert!(cents_off <= 5.01, "{freq} Hz is {cents_off} cents off bin center");
        }
        assert!(model.bin_for(30.0).is_none());
        assert!(model.bin_for(5000.0).is_none());
    }

    #[test]
    fn steady_candidates_decode_voiced() {
        let model = PitchModel::new(65.41, 1046.5);
        let frames: Vec<Observation> =
            (0..20).map(|_| single_candidate(&model, 220.0, 0.95)).collect();
        let path = decode(&model, &frames);
        let expected = model.bin_for(220.0).unwrap();
        assert!(path.iter().all(|b| *b == Some(expected)));
    }

    #[test]
    fn empty_mass_decodes_unvoiced() {
        let model = PitchModel::new(65.41, 1046.5);
        let frames: Vec<Observation> =
            (0..20).map(|_| Observation::from_candidates(&model, &[])).collect();
        let path = decode(&model, &frames);
        assert!(path.iter().all(|b| b.is_none()));
    }

    #[test]
    fn isolated_octave_spike_is_smoothed_away() {
        let model = PitchModel::new(65.41, 1046.5);
        let mut frames: Vec<Observation> =
            (0..30).map(|_| single_candidate(&model, 200.0, 0.9)).collect();
        // One frame where the octave error narrowly beats the true pitch.
        frames[15] = Observation::from_candidates(&model, &[(400.0, 0.5), (200.0, 0.45)]);
        let path = decode(&model, &frames);
        let expected = model.bin_for(200.0).unwrap();
        assert_eq!(path[15], Some(expected));
    }
}
