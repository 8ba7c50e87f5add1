use thiserror::Error;

/// Terminal analysis failures. None of these are retried; the message tells
/// the caller whether re-recording can help or the request itself was bad.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("audio too short: got {seconds:.1}s, need at least {min_seconds:.0}s")]
    AudioTooShort { seconds: f32, min_seconds: f32 },

    #[error(
        "not enough voiced audio detected ({voiced} voiced frames, need {required}); \
         record longer and louder (e.g. 30-45s of sustained singing)"
    )]
    InsufficientVoicedAudio { voiced: usize, required: usize },

    #[error("range estimation failed: rounded range {low_midi}..{high_midi} is degenerate")]
    DegenerateRange { low_midi: i32, high_midi: i32 },

    #[error("no songs to score")]
    EmptySongList,
}
