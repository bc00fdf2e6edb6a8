//! # Data Module
//!
//! Loading game logs from disk.
//!
//! The tournament runner writes one JSON file per game into a logs
//! directory. Loading is deliberately forgiving: a file that cannot be
//! read or parsed is skipped with a warning so one corrupt log never
//! blocks an analysis run.

use crate::error::{AnalysisError, Result};
use crate::models::{ExperimentId, GameLog, EXPERIMENT_IDS};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, warn};

/// Load a single game log from a JSON file.
pub fn load_game_log(path: &Path) -> Result<GameLog> {
    let content = fs::read_to_string(path).map_err(|e| {
        AnalysisError::IoError(format!("failed to read {}: {}", path.display(), e))
    })?;
    let game: GameLog = serde_json::from_str(&content)?;
    Ok(game)
}

/// Load every `*.json` game log in a directory, optionally restricted
/// to a single experiment condition.
///
/// Files that cannot be read or deserialized are skipped with a
/// warning. A missing directory yields an empty list.
pub fn load_game_logs(dir: &Path, experiment: Option<ExperimentId>) -> Result<Vec<GameLog>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "logs directory does not exist");
            return Ok(Vec::new());
        }
        Err(e) => {
            return Err(AnalysisError::IoError(format!(
                "failed to read logs directory {}: {}",
                dir.display(),
                e
            )))
        }
    };

    let mut games = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }

        match load_game_log(&path) {
            Ok(game) => {
                if experiment.is_none() || experiment == Some(game.experiment_id) {
                    games.push(game);
                }
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "skipping unparsable game log");
            }
        }
    }

    // Directory iteration order is platform-dependent.
    games.sort_by(|a, b| a.game_id.cmp(&b.game_id));
    debug!(count = games.len(), "loaded game logs");
    Ok(games)
}

/// Distinct model ids appearing in any loaded game, sorted.
pub fn unique_models(games: &[GameLog]) -> Vec<String> {
    let set: BTreeSet<&str> = games
        .iter()
        .flat_map(|g| g.players.iter().map(|p| p.model_id.as_str()))
        .collect();
    set.into_iter().map(str::to_string).collect()
}

/// Number of games per experiment condition. Conditions with no games
/// are present with a count of zero.
pub fn game_counts_by_experiment(games: &[GameLog]) -> BTreeMap<ExperimentId, usize> {
    let mut counts: BTreeMap<ExperimentId, usize> =
        EXPERIMENT_IDS.iter().map(|&id| (id, 0)).collect();
    for game in games {
        *counts.entry(game.experiment_id).or_insert(0) += 1;
    }
    counts
}
