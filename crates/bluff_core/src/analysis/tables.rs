//! # Tables Module
//!
//! Flattens nested game logs into per-turn and per-game rows.
//!
//! The flat rows feed the grouped analyses in [`super::research`] and
//! the CSV export; nothing downstream reaches back into the nested
//! log structure.

use crate::models::{ExperimentId, GameLog, TokenUsage};

/// One turn, flattened with its game context resolved.
#[derive(Debug, Clone)]
pub struct TurnRow {
    pub game_id: String,
    pub experiment_id: ExperimentId,
    pub turn_number: u32,
    pub player_id: String,
    pub model_id: String,
    pub claimed_rank: String,
    pub claimed_count: u32,
    /// `;`-joined card codes, e.g. `"KH;3C"`.
    pub actual_cards: String,
    pub was_lie: bool,
    pub challenged: bool,
    /// Empty when the turn was not challenged.
    pub challenger_id: String,
    pub challenger_model: String,
    pub challenge_correct: Option<bool>,
    pub pile_after: u32,
    pub reasoning: String,
    pub play_response_time_ms: Option<u64>,
    pub play_token_usage: Option<TokenUsage>,
    pub challenge_response_time_ms: Option<u64>,
    pub challenge_token_usage: Option<TokenUsage>,
}

/// One game, summarized.
#[derive(Debug, Clone)]
pub struct GameSummaryRow {
    pub game_id: String,
    pub experiment_id: ExperimentId,
    /// Model ids by seat; empty strings for absent seats.
    pub player_models: [String; 4],
    pub winner_id: String,
    pub winner_model: String,
    pub total_turns: u32,
    pub total_lies: u32,
    pub total_challenges: u32,
    pub successful_challenges: u32,
    pub duration_ms: u64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_tokens: u64,
}

/// Flatten every turn of every game into rows.
pub fn turn_rows(games: &[GameLog]) -> Vec<TurnRow> {
    let mut rows = Vec::new();

    for game in games {
        let model_map = game.model_map();

        for turn in &game.turns {
            let challenger_id = turn.challenger_id.clone().unwrap_or_default();
            let challenger_model = model_map
                .get(challenger_id.as_str())
                .map_or(String::new(), |m| (*m).to_string());

            rows.push(TurnRow {
                game_id: game.game_id.clone(),
                experiment_id: game.experiment_id,
                turn_number: turn.turn_number,
                player_id: turn.player_id.clone(),
                model_id: model_map
                    .get(turn.player_id.as_str())
                    .map_or(String::new(), |m| (*m).to_string()),
                claimed_rank: turn.claimed_rank.to_string(),
                claimed_count: turn.claimed_count,
                actual_cards: turn
                    .actual_cards
                    .iter()
                    .map(|c| c.code())
                    .collect::<Vec<_>>()
                    .join(";"),
                was_lie: turn.was_lie,
                challenged: turn.challenged,
                challenger_id,
                challenger_model,
                challenge_correct: turn.challenge_correct,
                pile_after: turn.pile_after_turn,
                reasoning: turn.reasoning.clone(),
                play_response_time_ms: turn.play_response_time_ms,
                play_token_usage: turn.play_token_usage,
                challenge_response_time_ms: turn.challenge_response_time_ms,
                challenge_token_usage: turn.challenge_token_usage,
            });
        }
    }

    rows
}

/// Summarize every game into one row.
pub fn game_summary_rows(games: &[GameLog]) -> Vec<GameSummaryRow> {
    games
        .iter()
        .map(|game| {
            let total_lies = game.turns.iter().filter(|t| t.was_lie).count() as u32;
            let total_challenges = game.turns.iter().filter(|t| t.challenged).count() as u32;
            let successful_challenges = game
                .turns
                .iter()
                .filter(|t| t.challenged && t.challenge_correct == Some(true))
                .count() as u32;

            let usage = |u: &Option<TokenUsage>| u.map(|u| (u.prompt_tokens, u.completion_tokens));
            let mut total_prompt_tokens = 0u64;
            let mut total_completion_tokens = 0u64;
            for t in &game.turns {
                for (prompt, completion) in
                    usage(&t.play_token_usage).into_iter().chain(usage(&t.challenge_token_usage))
                {
                    total_prompt_tokens += prompt;
                    total_completion_tokens += completion;
                }
            }

            let mut player_models: [String; 4] = Default::default();
            for (seat, player) in game.players.iter().take(4).enumerate() {
                player_models[seat] = player.model_id.clone();
            }

            GameSummaryRow {
                game_id: game.game_id.clone(),
                experiment_id: game.experiment_id,
                player_models,
                winner_id: game.winner.clone().unwrap_or_default(),
                winner_model: game.winner_model().unwrap_or_default().to_string(),
                total_turns: game.total_turns,
                total_lies,
                total_challenges,
                successful_challenges,
                duration_ms: game.duration_ms,
                total_prompt_tokens,
                total_completion_tokens,
                total_tokens: total_prompt_tokens + total_completion_tokens,
            }
        })
        .collect()
}
