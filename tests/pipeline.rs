use vocalmatch::analysis;
use vocalmatch::error::AnalysisError;
use vocalmatch::pitch::{self, TrackerConfig};
use vocalmatch::score::{rank_songs, Song};

const SAMPLE_RATE: u32 = 22050;

fn sine(freq_hz: f32, secs: f32) -> Vec<f32> {
    let len = (secs * SAMPLE_RATE as f32) as usize;
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * freq_hz * t).sin()
        })
        .collect()
}

/// Exponential glissando from `f0` to `f1` with a phase-continuous sweep.
fn glissando(f0: f32, f1: f32, secs: f32) -> Vec<f32> {
    let len = (secs * SAMPLE_RATE as f32) as usize;
    let ratio = f1 / f0;
    let k = ratio.ln();
    (0..len)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            // phase(t) = 2*pi * integral of f0 * ratio^(t/T) dt
            let phase = 2.0 * std::f32::consts::PI * f0 * secs / k * (ratio.powf(t / secs) - 1.0);
            phase.sin()
        })
        .collect()
}

fn song(id: &str, min_note: i32, max_note: i32) -> Song {
    Song {
        id: id.to_string(),
        title: id.to_string(),
        artist: String::new(),
        link: String::new(),
        min_note,
        max_note,
    }
}

#[test]
fn pure_sine_is_voiced_and_accurate() {
    let cfg = TrackerConfig::default();
    let target = 220.0;
    let frames = pitch::track(&sine(target, 3.0), SAMPLE_RATE, &cfg);
    assert!(frames.len() > 100);

    let voiced = frames.iter().filter(|f| f.f0_hz.is_some()).count();
    assert!(voiced * 10 >= frames.len() * 9, "{voiced}/{} frames voiced", frames.len());

    let accurate = frames
        .iter()
        .filter_map(|f| f.f0_hz)
        .filter(|hz| (hz - target).abs() / target < 0.01)
        .count();
    assert!(accurate * 2 > frames.len(), "{accurate}/{} frames within 1%", frames.len());
}

#[test]
fn silence_yields_insufficient_voiced_audio() {
    let cfg = TrackerConfig::default();
    let samples = vec![0.0f32; (SAMPLE_RATE * 4) as usize];

    let frames = pitch::track(&samples, SAMPLE_RATE, &cfg);
    let voiced = frames.iter().filter(|f| f.f0_hz.is_some()).count();
    assert!(voiced * 20 < frames.len(), "silence produced {voiced} voiced frames");

    assert!(matches!(
        analysis::analyze(&samples, SAMPLE_RATE, &cfg),
        Err(AnalysisError::InsufficientVoicedAudio { .. })
    ));
}

#[test]
fn dc_offset_buffer_yields_insufficient_voiced_audio() {
    let cfg = TrackerConfig::default();
    let samples = vec![0.5f32; (SAMPLE_RATE * 3) as usize];

    let frames = pitch::track(&samples, SAMPLE_RATE, &cfg);
    assert!(frames.iter().all(|f| f.f0_hz.is_none()));

    assert!(matches!(
        analysis::analyze(&samples, SAMPLE_RATE, &cfg),
        Err(AnalysisError::InsufficientVoicedAudio { .. })
    ));
}

#[test]
fn short_recording_is_rejected_before_tracking() {
    let cfg = TrackerConfig::default();
    let samples = sine(220.0, 1.0);
    assert!(matches!(
        analysis::analyze(&samples, SAMPLE_RATE, &cfg),
        Err(AnalysisError::AudioTooShort { .. })
    ));
}

#[test]
fn glissando_produces_a_plausible_range() {
    let cfg = TrackerConfig::default();
    // Sweep roughly D3 to G4, a comfortable baritone-ish span.
    let samples = glissando(150.0, 400.0, 5.0);
    let range = analysis::analyze(&samples, SAMPLE_RATE, &cfg).unwrap();

    assert!(
        (50..=53).contains(&range.low_midi),
        "low end {} ({})",
        range.low_midi,
        range.low_name
    );
    assert!(
        (64..=67).contains(&range.high_midi),
        "high end {} ({})",
        range.high_midi,
        range.high_name
    );
    assert!(range.high_midi > range.low_midi);
    assert!(range.jitter >= 0.0);
}

#[test]
fn inside_song_outranks_outside_song() {
    // User range C3-G4 per the reference scenario.
    let songs = vec![song("outside-above", 70, 80), song("fully-inside", 50, 65)];
    let ranked = rank_songs(48, 67, &songs, 2).unwrap();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].song.id, "fully-inside");
    assert_eq!(ranked[1].song.id, "outside-above");
    assert!(ranked[0].score > ranked[1].score);
}

#[test]
fn end_to_end_recommends_a_singable_song() {
    let cfg = TrackerConfig::default();
    let samples = glissando(150.0, 400.0, 5.0);
    let range = analysis::analyze(&samples, SAMPLE_RATE, &cfg).unwrap();

    let songs = vec![
        song("too-high", 72, 84),
        song("fits", range.low_midi + 1, range.high_midi - 1),
        song("too-low", 24, 36),
    ];
    let ranked = rank_songs(range.low_midi, range.high_midi, &songs, 1).unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].song.id, "fits");
}
