//! Vocal range analysis and song matching.
//!
//! Pipeline: mono samples -> pitch track ([`pitch`]) -> vocal range
//! ([`range`]) -> ranked songs ([`score`]). Every stage is a pure function
//! over its input; the binary adds fetch/decode and the JSON report.

pub mod analysis;
pub mod audio;
pub mod error;
pub mod pitch;
pub mod range;
pub mod score;
