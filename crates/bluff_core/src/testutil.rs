//! Shared builders for synthetic game logs in unit tests.

use crate::models::{Card, ExperimentId, GameLog, PlayerRef, Rank, Suit, Turn};
use chrono::{TimeZone, Utc};
use std::collections::HashMap;

/// Build a turn. `challenge` is `(challenger_id, challenge_correct)`.
pub(crate) fn turn(
    turn_number: u32,
    player_id: &str,
    was_lie: bool,
    challenged: bool,
    challenge: Option<(&str, bool)>,
) -> Turn {
    Turn {
        turn_number,
        player_id: player_id.to_string(),
        claimed_rank: Rank::King,
        claimed_count: 1,
        actual_cards: vec![Card {
            rank: if was_lie { Rank::Three } else { Rank::King },
            suit: Suit::Hearts,
        }],
        was_lie,
        challenged,
        challenger_id: challenge.map(|(id, _)| id.to_string()),
        challenge_correct: challenge.map(|(_, correct)| correct),
        reasoning: String::new(),
        challenge_reasoning: None,
        pile_after_turn: turn_number,
        hand_sizes_after_turn: HashMap::new(),
        play_response_time_ms: None,
        play_token_usage: None,
        challenge_response_time_ms: None,
        challenge_token_usage: None,
    }
}

/// Build a game log from `(player_id, model_id)` pairs and turns.
pub(crate) fn game(
    game_id: &str,
    experiment_id: ExperimentId,
    players: &[(&str, &str)],
    winner: Option<&str>,
    turns: Vec<Turn>,
) -> GameLog {
    let start = Utc.with_ymd_and_hms(2025, 1, 15, 10, 0, 0).unwrap();
    GameLog {
        game_id: game_id.to_string(),
        experiment_id,
        players: players
            .iter()
            .map(|(id, model_id)| PlayerRef {
                id: (*id).to_string(),
                model_id: (*model_id).to_string(),
            })
            .collect(),
        total_turns: turns.len() as u32,
        turns,
        winner: winner.map(str::to_string),
        start_time: start,
        end_time: start + chrono::Duration::minutes(5),
        duration_ms: 300_000,
    }
}
