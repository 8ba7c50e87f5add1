//! Score candidate songs against an estimated vocal range.
//!
//! The score rewards overlap (weighted toward covering the song), adds a
//! bonus for songs fully inside the singer's range and caps the penalty for
//! sticking outside it at one octave, so a wildly out-of-range song stays
//! interpretable instead of going arbitrarily negative.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A candidate song with its declared note range in MIDI semitones.
/// Field names follow the external API's camelCase convention.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub link: String,
    pub min_note: i32,
    pub max_note: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoredSong {
    #[serde(flatten)]
    pub song: Song,
    pub score: f32,
}

/// Compatibility of one song range with the user's range. Unbounded ranking
/// key, not a probability.
pub fn score_song(user_low: i32, user_high: i32, song_min: i32, song_max: i32) -> f32 {
    let overlap = (user_high.min(song_max) - user_low.max(song_min)).max(0) as f32;
    // Floor of one semitone keeps degenerate single-note ranges divisible.
    let song_len = (song_max - song_min).max(1) as f32;
    let user_len = (user_high - user_low).max(1) as f32;

    let inside_bonus = if song_min >= user_low && song_max <= user_high {
        0.25
    } else {
        0.0
    };

    let exceed = ((user_low - song_min).max(0) + (song_max - user_high).max(0)) as f32;
    let exceed_penalty = (exceed / 12.0).min(1.0);

    0.7 * overlap / song_len + 0.3 * overlap / user_len + inside_bonus - exceed_penalty
}

/// Score every song and keep the top `k`, descending by score. The sort is
/// stable: ties keep their input order.
pub fn rank_songs(
    user_low: i32,
    user_high: i32,
    songs: &[Song],
    k: usize,
) -> Result<Vec<ScoredSong>, AnalysisError> {
    if songs.is_empty() {
        return Err(AnalysisError::EmptySongList);
    }

    let mut scored: Vec<ScoredSong> = songs
        .iter()
        .map(|song| ScoredSong {
            score: score_song(user_low, user_high, song.min_note, song.max_note),
            song: song.clone(),
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(k);
    Ok(scored)
}
