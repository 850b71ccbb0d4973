//! Trail puzzle generation for the single-player memory game.
//!
//! A puzzle is a trail of emoji the player has to memorize and a board of
//! [`OPTION_COUNT`] distinct options to pick them back from.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The symbol universe puzzles are drawn from.
pub const SYMBOLS: [&str; 32] = [
    "🍎", "🍌", "🍇", "🍉", "🍒", "🍓", "🍍", "🥝", "🥕", "🌽", "🍄", "🥑", "🐶", "🐱", "🐭", "🐹",
    "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐸", "⭐", "🌙", "☀️", "🌈", "⚡", "🔥", "💧", "❄️",
];

/// Number of options on every board. Also the highest playable level, since
/// the board must be able to hold every symbol of the trail.
pub const OPTION_COUNT: usize = 12;

pub const MIN_LEVEL: i64 = 1;
pub const MAX_LEVEL: i64 = OPTION_COUNT as i64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrailError {
    #[error("level {level} is out of range, expected {min}..={max}")]
    LevelOutOfRange { level: i64, min: i64, max: i64 },
}

/// Body of `POST /generate`. A missing level means level 1.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerateRequest {
    #[serde(default = "default_level")]
    pub level: i64,
}

fn default_level() -> i64 {
    MIN_LEVEL
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Puzzle {
    /// Symbols to memorize, in order; may repeat
    pub trail: Vec<String>,
    /// Shuffled board containing every trail symbol plus distractors
    pub options: Vec<String>,
}

/// Generates a puzzle for `level`.
///
/// The trail draws `level` symbols with replacement. The options are the
/// distinct trail symbols topped up with distractors that never occur in
/// the trail, for exactly [`OPTION_COUNT`] distinct entries, then shuffled.
pub fn generate<R: Rng + ?Sized>(level: i64, rng: &mut R) -> Result<Puzzle, TrailError> {
    if !(MIN_LEVEL..=MAX_LEVEL).contains(&level) {
        return Err(TrailError::LevelOutOfRange {
            level,
            min: MIN_LEVEL,
            max: MAX_LEVEL,
        });
    }

    let trail: Vec<&str> = (0..level)
        .filter_map(|_| SYMBOLS.choose(rng).copied())
        .collect();

    let mut options: Vec<&str> = Vec::with_capacity(OPTION_COUNT);
    for &symbol in &trail {
        if !options.contains(&symbol) {
            options.push(symbol);
        }
    }

    let distractors: Vec<&str> = SYMBOLS
        .iter()
        .copied()
        .filter(|symbol| !options.contains(symbol))
        .collect();
    let missing = OPTION_COUNT - options.len();
    options.extend(distractors.choose_multiple(rng, missing).copied());
    options.shuffle(rng);

    Ok(Puzzle {
        trail: trail.into_iter().map(str::to_string).collect(),
        options: options.into_iter().map(str::to_string).collect(),
    })
}
