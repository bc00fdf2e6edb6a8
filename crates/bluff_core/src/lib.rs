//! # bluff_core
//!
//! Metrics and statistical analysis for tournament logs of an LLM
//! bluffing card game.
//!
//! The pipeline: [`data`] loads JSON game logs, [`analysis`] computes
//! per-model behavioral metrics, flat tables and hypothesis tests,
//! then [`report`], [`export`] and [`plot`] render the results as
//! console reports, CSV files and SVG figures.
//!
//! ## Example
//! ```no_run
//! use bluff_core::analysis::metrics::calculate_all_stats;
//! use bluff_core::data::{load_game_logs, unique_models};
//! use bluff_core::report::summary_report;
//!
//! # fn main() -> bluff_core::Result<()> {
//! let games = load_game_logs("logs/games".as_ref(), None)?;
//! let models = unique_models(&games);
//! let stats = calculate_all_stats(&models, &games, None);
//! println!("{}", summary_report(&stats));
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod data;
pub mod error;
pub mod export;
pub mod models;
pub mod plot;
pub mod report;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{AnalysisError, Result};
pub use models::{Card, ExperimentId, GameLog, PlayerRef, Rank, Suit, TokenUsage, Turn};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
