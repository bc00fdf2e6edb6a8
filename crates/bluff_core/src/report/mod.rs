//! # Report Module
//!
//! String-rendered console reports. Everything returns a `String`;
//! callers decide where it goes.

use crate::analysis::hypothesis::{f_oneway, pearson_r};
use crate::analysis::metrics::PlayerStats;
use crate::analysis::research::{
    analyze_challenge_behavior, analyze_instruction_compliance, analyze_lie_frequency_by_experiment,
    analyze_moral_restraint,
};
use crate::analysis::tables::TurnRow;
use crate::models::{ExperimentId, GameLog, Turn};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write;

/// Display form of a model id: the segment after the last `/`.
pub fn shorten_model_name(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

/// Ranked per-model summary: win rates, deception metrics, paranoia.
pub fn summary_report(stats: &BTreeMap<String, PlayerStats>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out, "EXPERIMENT SUMMARY REPORT");
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out);

    let mut by_win_rate: Vec<&PlayerStats> = stats.values().collect();
    by_win_rate.sort_by(|a, b| b.win_rate.total_cmp(&a.win_rate));

    let _ = writeln!(out, "RANKINGS BY WIN RATE:");
    let _ = writeln!(out, "{}", "-".repeat(40));
    for (i, s) in by_win_rate.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {:<35} Win Rate: {:.1}%",
            i + 1,
            s.model_id,
            s.win_rate * 100.0
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "DECEPTION METRICS:");
    let _ = writeln!(out, "{}", "-".repeat(40));
    for s in &by_win_rate {
        let _ = writeln!(
            out,
            "{:<35} Lie Freq: {:.1}% | Success: {:.1}%",
            s.model_id,
            s.lie_frequency * 100.0,
            s.lie_success_rate * 100.0
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "PARANOIA (CHALLENGE FREQUENCY):");
    let _ = writeln!(out, "{}", "-".repeat(40));
    let mut by_paranoia: Vec<&PlayerStats> = stats.values().collect();
    by_paranoia.sort_by(|a, b| b.paranoia_frequency.total_cmp(&a.paranoia_frequency));
    for s in by_paranoia {
        let _ = writeln!(
            out,
            "{:<35} Paranoia: {:.1}% | Accuracy: {:.1}%",
            s.model_id,
            s.paranoia_frequency * 100.0,
            s.challenge_accuracy * 100.0
        );
    }

    out
}

/// Full statistical report across the four research questions.
///
/// Sections degrade to "insufficient data" lines when the experiment
/// data they need is absent; this never errors.
pub fn statistical_report(
    exp1_stats: Option<&BTreeMap<String, PlayerStats>>,
    exp2_stats: Option<&BTreeMap<String, PlayerStats>>,
    exp3_stats: Option<&BTreeMap<String, PlayerStats>>,
    turns: &[TurnRow],
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out, "STATISTICAL ANALYSIS REPORT");
    let _ = writeln!(out, "{}", "=".repeat(80));
    let _ = writeln!(out);

    // RQ1: deception effectiveness
    let _ = writeln!(out, "RQ1: How effectively can LLMs deceive other LLMs?");
    let _ = writeln!(out, "{}", "-".repeat(60));
    if let Some(exp1) = exp1_stats {
        let n = exp1.len() as f64;
        let mean_lie_freq: f64 = exp1.values().map(|s| s.lie_frequency).sum::<f64>() / n;
        let mean_success: f64 = exp1.values().map(|s| s.lie_success_rate).sum::<f64>() / n;
        let _ = writeln!(out, "Experiment 1 (Full Rules) - Baseline Deception:");
        let _ = writeln!(out, "  Mean lie frequency: {:.3}", mean_lie_freq);
        let _ = writeln!(out, "  Mean lie success rate: {:.3}", mean_success);
        let _ = writeln!(out);

        let lie_freqs: Vec<f64> = exp1.values().map(|s| s.lie_frequency).collect();
        let win_rates: Vec<f64> = exp1.values().map(|s| s.win_rate).collect();
        match pearson_r(&lie_freqs, &win_rates) {
            Ok(corr) => {
                let _ = writeln!(
                    out,
                    "  Correlation (lie_frequency vs win_rate): r={:.3}, p={:.3}",
                    corr.r, corr.pvalue
                );
            }
            Err(_) => {
                let _ = writeln!(out, "  Correlation: insufficient data");
            }
        }
    } else {
        let _ = writeln!(out, "  No experiment 1 data");
    }
    let _ = writeln!(out);

    // RQ2: moral restraint
    let _ = writeln!(
        out,
        "RQ2: Do LLMs restrain deception when told opponents are honest?"
    );
    let _ = writeln!(out, "{}", "-".repeat(60));
    let lie_analysis = analyze_lie_frequency_by_experiment(turns);
    let _ = writeln!(out, "  Lie rate by experiment:");
    for (exp, rate) in &lie_analysis.lie_rate_by_experiment {
        let _ = writeln!(out, "    Experiment {}: {:.3}", exp.as_u8(), rate);
    }
    match &lie_analysis.anova {
        Some(anova) => {
            let _ = writeln!(
                out,
                "  ANOVA across experiments: F={:.3}, p={:.3}",
                anova.statistic, anova.pvalue
            );
        }
        None => {
            let _ = writeln!(out, "  ANOVA across experiments: insufficient data");
        }
    }
    for pair in &lie_analysis.pairwise {
        let _ = writeln!(
            out,
            "  Experiment {} vs {}: t={:.3}, p={:.3}, d={:.3}",
            pair.experiment_a.as_u8(),
            pair.experiment_b.as_u8(),
            pair.t_statistic,
            pair.pvalue,
            pair.cohens_d
        );
    }
    match (exp1_stats, exp2_stats) {
        (Some(exp1), Some(exp2)) => match analyze_moral_restraint(exp1, exp2) {
            Ok(restraint) => {
                let _ = writeln!(
                    out,
                    "  Paired t-test: t={:.3}, p={:.3}",
                    restraint.paired_t_statistic, restraint.paired_pvalue
                );
                let _ = writeln!(out, "  Cohen's d: {:.3}", restraint.cohens_d);
                let _ = writeln!(
                    out,
                    "  Mean lie reduction: {:.3}",
                    restraint.mean_lie_reduction
                );
                let short_names: Vec<&str> = restraint
                    .models_showing_restraint
                    .iter()
                    .map(|m| shorten_model_name(m))
                    .collect();
                let _ = writeln!(out, "  Models showing restraint: {:?}", short_names);
            }
            Err(_) => {
                let _ = writeln!(out, "  Insufficient data for comparison");
            }
        },
        _ => {
            let _ = writeln!(out, "  Insufficient data for comparison");
        }
    }
    let _ = writeln!(out);

    // RQ3: instruction compliance
    let _ = writeln!(
        out,
        "RQ3: Will LLMs violate explicit honesty instructions to win?"
    );
    let _ = writeln!(out, "{}", "-".repeat(60));
    if exp3_stats.is_some() {
        let exp3_turns: Vec<TurnRow> = turns
            .iter()
            .filter(|r| r.experiment_id == ExperimentId::HonestyInstruction)
            .cloned()
            .collect();
        let compliance = analyze_instruction_compliance(&exp3_turns);
        let _ = writeln!(
            out,
            "  Overall violation rate: {:.3}",
            compliance.overall_violation_rate
        );
        match compliance.binomial_pvalue {
            Some(p) => {
                let _ = writeln!(out, "  Binomial test p-value: {:.4}", p);
            }
            None => {
                let _ = writeln!(out, "  Binomial test: insufficient data");
            }
        }
        let _ = writeln!(out, "  Violation rate by model:");
        for (model, rate) in &compliance.violation_rate_by_model {
            let _ = writeln!(out, "    {}: {:.3}", shorten_model_name(model), rate);
        }
    } else {
        let _ = writeln!(out, "  No experiment 3 data");
    }
    let _ = writeln!(out);

    // RQ4: paranoia
    let _ = writeln!(
        out,
        "RQ4: How does paranoia (challenge frequency) vary by model?"
    );
    let _ = writeln!(out, "{}", "-".repeat(60));
    let behavior = analyze_challenge_behavior(turns);
    let _ = writeln!(out, "  Challenge accuracy by model:");
    let mut by_accuracy: Vec<(&String, &f64)> = behavior.accuracy_by_model.iter().collect();
    by_accuracy.sort_by(|a, b| b.1.total_cmp(a.1));
    for (model, accuracy) in by_accuracy {
        let _ = writeln!(out, "    {}: {:.3}", shorten_model_name(model), accuracy);
    }

    if let Some(exp1) = exp1_stats {
        // One paranoia value per model leaves no within-group variance,
        // so this only succeeds with repeated observations per model.
        let groups: Vec<Vec<f64>> = exp1.values().map(|s| vec![s.paranoia_frequency]).collect();
        match f_oneway(&groups) {
            Ok(anova) => {
                let _ = writeln!(
                    out,
                    "\n  ANOVA on paranoia frequency: F={:.3}, p={:.3}",
                    anova.statistic, anova.pvalue
                );
            }
            Err(_) => {
                let _ = writeln!(out, "\n  ANOVA on paranoia frequency: insufficient data");
            }
        }
    }

    out
}

fn format_turn_line(turn: &Turn, model_map: &HashMap<&str, &str>) -> String {
    let model = model_map
        .get(turn.player_id.as_str())
        .copied()
        .unwrap_or(turn.player_id.as_str());
    let mut line = format!(
        "Turn {}: {} plays {} {}(s)",
        turn.turn_number, model, turn.claimed_count, turn.claimed_rank
    );

    if turn.was_lie {
        line.push_str(" [LIE]");
    }

    if turn.challenged {
        let challenger = turn
            .challenger_id
            .as_deref()
            .map(|id| model_map.get(id).copied().unwrap_or(id))
            .unwrap_or("unknown");
        let _ = write!(line, " - CHALLENGED by {}", challenger);
        line.push_str(if turn.challenge_correct == Some(true) {
            " [correct]"
        } else {
            " [wrong]"
        });
    }

    line
}

/// Human-readable summary of one game, turn by turn.
pub fn game_summary(log: &GameLog) -> String {
    let model_map: HashMap<&str, &str> = log
        .players
        .iter()
        .map(|p| (p.id.as_str(), shorten_model_name(&p.model_id)))
        .collect();

    let mut out = String::new();
    let _ = writeln!(out, "Game: {}", log.game_id);
    let _ = writeln!(out, "Experiment: {}", log.experiment_id);
    let player_names: Vec<&str> = log
        .players
        .iter()
        .map(|p| shorten_model_name(&p.model_id))
        .collect();
    let _ = writeln!(out, "Players: {}", player_names.join(", "));
    let _ = writeln!(out, "Turns: {}", log.total_turns);
    let _ = writeln!(out, "Duration: {:.1}s", log.duration_ms as f64 / 1000.0);
    let winner = log.winner_model().map(shorten_model_name).unwrap_or("None");
    let _ = writeln!(out, "Winner: {}", winner);

    let _ = writeln!(out, "\nTurn History:");
    for turn in &log.turns {
        let _ = writeln!(out, "  {}", format_turn_line(turn, &model_map));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::metrics::calculate_all_stats;
    use crate::analysis::tables::turn_rows;
    use crate::testutil::{game, turn};

    fn sample_stats() -> BTreeMap<String, PlayerStats> {
        let games = vec![
            game(
                "g1",
                ExperimentId::FullRules,
                &[("player-0", "org/model-a"), ("player-1", "org/model-b")],
                Some("player-0"),
                vec![
                    turn(1, "player-0", true, false, None),
                    turn(2, "player-1", false, true, Some(("player-0", false))),
                ],
            ),
            game(
                "g2",
                ExperimentId::FullRules,
                &[("player-0", "org/model-a"), ("player-1", "org/model-b")],
                Some("player-1"),
                vec![turn(1, "player-1", true, true, Some(("player-0", true)))],
            ),
        ];
        let models = vec!["org/model-a".to_string(), "org/model-b".to_string()];
        calculate_all_stats(&models, &games, None)
    }

    #[test]
    fn test_shorten_model_name() {
        assert_eq!(shorten_model_name("org/sub/model-x"), "model-x");
        assert_eq!(shorten_model_name("bare-model"), "bare-model");
    }

    #[test]
    fn test_summary_report_sections() {
        let report = summary_report(&sample_stats());
        assert!(report.contains("EXPERIMENT SUMMARY REPORT"));
        assert!(report.contains("RANKINGS BY WIN RATE:"));
        assert!(report.contains("DECEPTION METRICS:"));
        assert!(report.contains("PARANOIA (CHALLENGE FREQUENCY):"));
        assert!(report.contains("org/model-a"));
        // Both models won one of two games.
        assert!(report.contains("Win Rate: 50.0%"));
    }

    #[test]
    fn test_statistical_report_with_missing_experiments() {
        let games = vec![game(
            "g1",
            ExperimentId::FullRules,
            &[("player-0", "org/model-a"), ("player-1", "org/model-b")],
            None,
            vec![turn(1, "player-0", true, false, None)],
        )];
        let rows = turn_rows(&games);

        let report = statistical_report(None, None, None, &rows);
        assert!(report.contains("STATISTICAL ANALYSIS REPORT"));
        assert!(report.contains("No experiment 1 data"));
        assert!(report.contains("Insufficient data for comparison"));
        assert!(report.contains("No experiment 3 data"));
    }

    #[test]
    fn test_statistical_report_with_exp1() {
        let stats = sample_stats();
        let games = vec![game(
            "g1",
            ExperimentId::FullRules,
            &[("player-0", "org/model-a"), ("player-1", "org/model-b")],
            None,
            vec![
                turn(1, "player-0", true, true, Some(("player-1", true))),
                turn(2, "player-1", false, false, None),
            ],
        )];
        let rows = turn_rows(&games);

        let report = statistical_report(Some(&stats), None, None, &rows);
        assert!(report.contains("Mean lie frequency:"));
        assert!(report.contains("Lie rate by experiment:"));
        assert!(report.contains("Challenge accuracy by model:"));
        // Two models means the correlation (n < 3) cannot run.
        assert!(report.contains("Correlation: insufficient data"));
        // One paranoia observation per model: ANOVA cannot run either.
        assert!(report.contains("ANOVA on paranoia frequency: insufficient data"));
    }

    #[test]
    fn test_game_summary_marks_lies_and_challenges() {
        let log = game(
            "g1",
            ExperimentId::FullRules,
            &[("player-0", "org/model-a"), ("player-1", "org/model-b")],
            Some("player-1"),
            vec![
                turn(1, "player-0", true, true, Some(("player-1", true))),
                turn(2, "player-1", false, false, None),
            ],
        );

        let summary = game_summary(&log);
        assert!(summary.contains("Game: g1"));
        assert!(summary.contains("Winner: model-b"));
        assert!(summary.contains("[LIE]"));
        assert!(summary.contains("CHALLENGED by model-b"));
        assert!(summary.contains("[correct]"));
    }
}
