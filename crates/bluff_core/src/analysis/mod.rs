//! # Analysis Module
//!
//! Metric aggregation and inferential statistics over game logs.
//!
//! ## Submodules
//!
//! - `metrics` - Per-model behavioral statistics (win/lie/challenge rates)
//! - `tables` - Flattening games into per-turn and per-game rows
//! - `hypothesis` - Classical hypothesis tests (t, ANOVA, chi-square, binomial)
//! - `research` - Research-question analyses built from the above

pub mod hypothesis;
pub mod metrics;
pub mod research;
pub mod tables;
