//! # Models Module
//!
//! Data model for bluffing-game tournament logs.
//!
//! Game logs are produced by an external tournament runner as JSON files,
//! one per game, with camelCase field names. Everything here mirrors that
//! wire format; the analysis layers never touch raw JSON.

pub mod game;

pub use game::{
    Card, ExperimentId, GameLog, PlayerRef, Rank, Suit, TokenUsage, Turn, EXPERIMENT_IDS,
};
