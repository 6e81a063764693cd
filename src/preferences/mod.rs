//! Pairwise preference matrices and their synthetic generator.
//!
//! Every student `i` spreads a fixed budget of points over all students,
//! giving themself exactly 1 and every other student a score in `[1, 9]`.
//! The generator reproduces this with per-row rejection sampling: draw a
//! band of mild scores and a band of strong scores, and accept the row only
//! when the remaining budget is itself a legal score.

mod config;
mod generator;
mod matrix;

pub use config::{default_points_to_give, GeneratorConfig, MILD_BAND, MIN_STUDENTS, STRONG_BAND};
pub use generator::{create_rng, PreferenceGenerator};
pub use matrix::{PreferenceMatrix, MAX_SCORE, MIN_SCORE, SELF_SCORE};
