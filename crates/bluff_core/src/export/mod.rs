//! # Export Module
//!
//! CSV export of the flat tables and per-model statistics.
//!
//! Conventions shared by every file: booleans as `1`/`0`, absent
//! optional values as empty cells, rates at four decimal places.

use crate::analysis::metrics::{ExperimentComparison, PlayerStats};
use crate::analysis::tables::{GameSummaryRow, TurnRow};
use crate::error::Result;
use crate::models::{ExperimentId, TokenUsage};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

fn bool_cell(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

fn opt_bool_cell(value: Option<bool>) -> &'static str {
    match value {
        Some(v) => bool_cell(v),
        None => "",
    }
}

fn opt_u64_cell(value: Option<u64>) -> String {
    value.map_or(String::new(), |v| v.to_string())
}

fn rate_cell(value: f64) -> String {
    format!("{:.4}", value)
}

fn token_cells(usage: Option<TokenUsage>) -> (String, String, String) {
    match usage {
        Some(u) => (
            u.prompt_tokens.to_string(),
            u.completion_tokens.to_string(),
            u.total_tokens.to_string(),
        ),
        None => (String::new(), String::new(), String::new()),
    }
}

fn open_writer(out_dir: &Path, file_name: &str) -> Result<(csv::Writer<fs::File>, PathBuf)> {
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(file_name);
    let writer = csv::Writer::from_path(&path)?;
    Ok((writer, path))
}

/// Write every turn row to `all_turns.csv` under `out_dir`.
///
/// Returns the path of the written file.
pub fn export_turns(rows: &[TurnRow], out_dir: &Path) -> Result<PathBuf> {
    let (mut writer, path) = open_writer(out_dir, "all_turns.csv")?;

    writer.write_record([
        "game_id",
        "experiment_id",
        "turn_number",
        "player_id",
        "model_id",
        "claimed_rank",
        "claimed_count",
        "actual_cards",
        "was_lie",
        "challenged",
        "challenger_id",
        "challenger_model",
        "challenge_correct",
        "pile_after",
        "reasoning",
        "play_response_time_ms",
        "play_prompt_tokens",
        "play_completion_tokens",
        "play_total_tokens",
        "challenge_response_time_ms",
        "challenge_prompt_tokens",
        "challenge_completion_tokens",
        "challenge_total_tokens",
    ])?;

    for row in rows {
        let (play_prompt, play_completion, play_total) = token_cells(row.play_token_usage);
        let (challenge_prompt, challenge_completion, challenge_total) =
            token_cells(row.challenge_token_usage);

        writer.write_record([
            row.game_id.clone(),
            row.experiment_id.as_u8().to_string(),
            row.turn_number.to_string(),
            row.player_id.clone(),
            row.model_id.clone(),
            row.claimed_rank.clone(),
            row.claimed_count.to_string(),
            row.actual_cards.clone(),
            bool_cell(row.was_lie).to_string(),
            bool_cell(row.challenged).to_string(),
            row.challenger_id.clone(),
            row.challenger_model.clone(),
            opt_bool_cell(row.challenge_correct).to_string(),
            row.pile_after.to_string(),
            row.reasoning.clone(),
            opt_u64_cell(row.play_response_time_ms),
            play_prompt,
            play_completion,
            play_total,
            opt_u64_cell(row.challenge_response_time_ms),
            challenge_prompt,
            challenge_completion,
            challenge_total,
        ])?;
    }

    writer.flush()?;
    Ok(path)
}

/// Write per-game summaries to `game_summary.csv` under `out_dir`.
pub fn export_game_summary(rows: &[GameSummaryRow], out_dir: &Path) -> Result<PathBuf> {
    let (mut writer, path) = open_writer(out_dir, "game_summary.csv")?;

    writer.write_record([
        "game_id",
        "experiment_id",
        "player0_model",
        "player1_model",
        "player2_model",
        "player3_model",
        "winner_id",
        "winner_model",
        "total_turns",
        "total_lies",
        "total_challenges",
        "successful_challenges",
        "duration_ms",
        "total_prompt_tokens",
        "total_completion_tokens",
        "total_tokens",
    ])?;

    for row in rows {
        writer.write_record([
            row.game_id.clone(),
            row.experiment_id.as_u8().to_string(),
            row.player_models[0].clone(),
            row.player_models[1].clone(),
            row.player_models[2].clone(),
            row.player_models[3].clone(),
            row.winner_id.clone(),
            row.winner_model.clone(),
            row.total_turns.to_string(),
            row.total_lies.to_string(),
            row.total_challenges.to_string(),
            row.successful_challenges.to_string(),
            row.duration_ms.to_string(),
            row.total_prompt_tokens.to_string(),
            row.total_completion_tokens.to_string(),
            row.total_tokens.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}

/// Write per-model statistics under `out_dir`.
///
/// The file is `player_stats_exp{N}.csv` when `experiment` is given,
/// `player_stats.csv` otherwise. The instruction-violation columns are
/// only populated for experiment 3.
pub fn export_player_stats(
    stats: &BTreeMap<String, PlayerStats>,
    experiment: Option<ExperimentId>,
    out_dir: &Path,
) -> Result<PathBuf> {
    let file_name = match experiment {
        Some(exp) => format!("player_stats_exp{}.csv", exp.as_u8()),
        None => "player_stats.csv".to_string(),
    };
    let (mut writer, path) = open_writer(out_dir, &file_name)?;

    writer.write_record([
        "model_id",
        "games_played",
        "wins",
        "win_rate",
        "total_plays",
        "total_lies",
        "lie_frequency",
        "successful_lies",
        "lie_success_rate",
        "challenges_made",
        "challenge_opportunities",
        "paranoia_frequency",
        "correct_challenges",
        "challenge_accuracy",
        "instruction_violations",
        "instruction_violation_rate",
    ])?;

    for s in stats.values() {
        writer.write_record([
            s.model_id.clone(),
            s.games_played.to_string(),
            s.wins.to_string(),
            rate_cell(s.win_rate),
            s.total_plays.to_string(),
            s.total_lies.to_string(),
            rate_cell(s.lie_frequency),
            s.successful_lies.to_string(),
            rate_cell(s.lie_success_rate),
            s.challenges_made.to_string(),
            s.challenge_opportunities.to_string(),
            rate_cell(s.paranoia_frequency),
            s.correct_challenges.to_string(),
            rate_cell(s.challenge_accuracy),
            s.instruction_violations
                .map_or(String::new(), |v| v.to_string()),
            s.instruction_violation_rate
                .map_or(String::new(), rate_cell),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}

/// Write experiment 1 vs 2 deltas to `experiment_comparison.csv`.
pub fn export_experiment_comparison(
    comparisons: &[ExperimentComparison],
    out_dir: &Path,
) -> Result<PathBuf> {
    let (mut writer, path) = open_writer(out_dir, "experiment_comparison.csv")?;

    writer.write_record([
        "model_id",
        "exp1_win_rate",
        "exp2_win_rate",
        "win_rate_change",
        "exp1_lie_frequency",
        "exp2_lie_frequency",
        "lie_frequency_change",
        "exp1_paranoia",
        "exp2_paranoia",
        "paranoia_change",
    ])?;

    for c in comparisons {
        writer.write_record([
            c.model_id.clone(),
            rate_cell(c.exp1_stats.win_rate),
            rate_cell(c.exp2_stats.win_rate),
            rate_cell(c.win_rate_change),
            rate_cell(c.exp1_stats.lie_frequency),
            rate_cell(c.exp2_stats.lie_frequency),
            rate_cell(c.lie_frequency_change),
            rate_cell(c.exp1_stats.paranoia_frequency),
            rate_cell(c.exp2_stats.paranoia_frequency),
            rate_cell(c.paranoia_change),
        ])?;
    }

    writer.flush()?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::{calculate_all_stats, compare_experiments};
    use crate::analysis::tables::{game_summary_rows, turn_rows};
    use crate::testutil::{game, turn};
    use tempfile::tempdir;

    fn read_rows(path: &Path) -> (csv::StringRecord, Vec<csv::StringRecord>) {
        let mut reader = csv::Reader::from_path(path).expect("csv should open");
        let headers = reader.headers().expect("csv should have headers").clone();
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .expect("csv rows should parse");
        (headers, rows)
    }

    fn sample_games() -> Vec<crate::models::GameLog> {
        vec![game(
            "g1",
            ExperimentId::FullRules,
            &[("player-0", "org/model-a"), ("player-1", "org/model-b")],
            Some("player-0"),
            vec![
                turn(1, "player-0", true, true, Some(("player-1", true))),
                turn(2, "player-1", false, false, None),
            ],
        )]
    }

    #[test]
    fn test_export_turns() {
        let dir = tempdir().expect("tempdir");
        let rows = turn_rows(&sample_games());

        let path = export_turns(&rows, dir.path()).expect("export should succeed");
        assert_eq!(path.file_name().unwrap(), "all_turns.csv");

        let (headers, records) = read_rows(&path);
        assert_eq!(headers.get(0), Some("game_id"));
        assert_eq!(headers.get(13), Some("pile_after"));
        assert_eq!(headers.get(18), Some("play_total_tokens"));
        assert_eq!(headers.get(22), Some("challenge_total_tokens"));
        assert_eq!(records.len(), 2);

        let first = &records[0];
        assert_eq!(first.get(1), Some("1"), "experiment id as number");
        assert_eq!(first.get(8), Some("1"), "was_lie as 1");
        assert_eq!(first.get(12), Some("1"), "challenge_correct as 1");
        assert_eq!(first.get(15), Some(""), "absent response time is empty");
        assert_eq!(first.get(18), Some(""), "absent token usage is empty");

        let second = &records[1];
        assert_eq!(second.get(8), Some("0"));
        assert_eq!(second.get(12), Some(""), "unchallenged turn stays empty");
    }

    #[test]
    fn test_export_turns_token_totals() {
        let dir = tempdir().expect("tempdir");
        let mut games = sample_games();
        games[0].turns[0].play_token_usage = Some(crate::models::TokenUsage {
            prompt_tokens: 120,
            completion_tokens: 30,
            total_tokens: 150,
        });
        let rows = turn_rows(&games);

        let path = export_turns(&rows, dir.path()).expect("export should succeed");
        let (_, records) = read_rows(&path);

        let first = &records[0];
        assert_eq!(first.get(16), Some("120"));
        assert_eq!(first.get(17), Some("30"));
        assert_eq!(first.get(18), Some("150"), "play token total written");
        assert_eq!(first.get(22), Some(""), "no challenge usage stays empty");
    }

    #[test]
    fn test_export_game_summary() {
        let dir = tempdir().expect("tempdir");
        let rows = game_summary_rows(&sample_games());

        let path = export_game_summary(&rows, dir.path()).expect("export should succeed");
        let (headers, records) = read_rows(&path);

        assert_eq!(headers.get(2), Some("player0_model"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(0), Some("g1"));
        assert_eq!(records[0].get(7), Some("org/model-a"), "winner model");
        assert_eq!(records[0].get(4), Some(""), "empty seat stays empty");
    }

    #[test]
    fn test_export_player_stats_filename_and_rates() {
        let dir = tempdir().expect("tempdir");
        let games = sample_games();
        let models = vec!["org/model-a".to_string(), "org/model-b".to_string()];
        let stats = calculate_all_stats(&models, &games, Some(ExperimentId::FullRules));

        let path = export_player_stats(&stats, Some(ExperimentId::FullRules), dir.path())
            .expect("export should succeed");
        assert_eq!(path.file_name().unwrap(), "player_stats_exp1.csv");

        let (_, records) = read_rows(&path);
        assert_eq!(records.len(), 2);

        let model_a = &records[0];
        assert_eq!(model_a.get(0), Some("org/model-a"));
        assert_eq!(model_a.get(3), Some("1.0000"), "win rate at 4 decimals");
        assert_eq!(model_a.get(14), Some(""), "violations empty outside exp 3");
    }

    #[test]
    fn test_export_player_stats_default_filename() {
        let dir = tempdir().expect("tempdir");
        let stats = BTreeMap::new();

        let path = export_player_stats(&stats, None, dir.path()).expect("export should succeed");
        assert_eq!(path.file_name().unwrap(), "player_stats.csv");
    }

    #[test]
    fn test_export_experiment_comparison() {
        let dir = tempdir().expect("tempdir");
        let exp1_games = sample_games();
        let exp2_games = vec![game(
            "g2",
            ExperimentId::AsymmetricHonesty,
            &[("player-0", "org/model-a"), ("player-1", "org/model-b")],
            Some("player-1"),
            vec![
                turn(1, "player-0", false, false, None),
                turn(2, "player-1", false, false, None),
            ],
        )];

        let comparison = compare_experiments("org/model-a", &exp1_games, &exp2_games);
        let path = export_experiment_comparison(&[comparison], dir.path())
            .expect("export should succeed");

        let (headers, records) = read_rows(&path);
        assert_eq!(headers.get(1), Some("exp1_win_rate"), "win rates lead");
        assert_eq!(headers.get(4), Some("exp1_lie_frequency"));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get(1), Some("1.0000"), "exp1 win rate");
        assert_eq!(records[0].get(3), Some("-1.0000"), "change is exp2 - exp1");
        assert_eq!(records[0].get(4), Some("1.0000"), "exp1 lie frequency");
        assert_eq!(records[0].get(5), Some("0.0000"), "exp2 lie frequency");
        assert_eq!(records[0].get(6), Some("-1.0000"));
    }

    #[test]
    fn test_export_creates_output_dir() {
        let dir = tempdir().expect("tempdir");
        let nested = dir.path().join("csv").join("out");

        export_turns(&[], &nested).expect("export should create directories");
        assert!(nested.join("all_turns.csv").exists());
    }
}
