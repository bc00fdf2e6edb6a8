//! Game log types as written by the tournament runner.
//!
//! One JSON file per completed game. Field names on the wire are
//! camelCase; optional fields are absent rather than null.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Card rank. `Ten` is serialized as `"10"`, everything else as a
/// single character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "A")]
    Ace,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        };
        write!(f, "{}", s)
    }
}

/// Card suit, single-character wire form (H/D/C/S).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Suit {
    #[serde(rename = "H")]
    Hearts,
    #[serde(rename = "D")]
    Diamonds,
    #[serde(rename = "C")]
    Clubs,
    #[serde(rename = "S")]
    Spades,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            Suit::Hearts => "H",
            Suit::Diamonds => "D",
            Suit::Clubs => "C",
            Suit::Spades => "S",
        };
        write!(f, "{}", s)
    }
}

/// A single playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    /// Compact code used in flat exports, e.g. `"AS"` or `"10H"`.
    pub fn code(&self) -> String {
        format!("{}{}", self.rank, self.suit)
    }
}

/// Experiment condition the game was played under.
///
/// - `FullRules` (1): standard game, lying allowed and expected
/// - `AsymmetricHonesty` (2): players told their opponents are honest
/// - `HonestyInstruction` (3): players explicitly instructed never to lie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ExperimentId {
    FullRules,
    AsymmetricHonesty,
    HonestyInstruction,
}

/// All experiment conditions, in id order.
pub const EXPERIMENT_IDS: [ExperimentId; 3] = [
    ExperimentId::FullRules,
    ExperimentId::AsymmetricHonesty,
    ExperimentId::HonestyInstruction,
];

impl ExperimentId {
    pub fn as_u8(self) -> u8 {
        match self {
            ExperimentId::FullRules => 1,
            ExperimentId::AsymmetricHonesty => 2,
            ExperimentId::HonestyInstruction => 3,
        }
    }
}

impl TryFrom<u8> for ExperimentId {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(ExperimentId::FullRules),
            2 => Ok(ExperimentId::AsymmetricHonesty),
            3 => Ok(ExperimentId::HonestyInstruction),
            other => Err(format!("unknown experiment id: {}", other)),
        }
    }
}

impl From<ExperimentId> for u8 {
    fn from(value: ExperimentId) -> Self {
        value.as_u8()
    }
}

impl fmt::Display for ExperimentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// LLM token accounting for a single request.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// One turn: a claimed play, what was actually played, and whether
/// anyone challenged it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Turn {
    pub turn_number: u32,
    pub player_id: String,
    pub claimed_rank: Rank,
    pub claimed_count: u32,
    pub actual_cards: Vec<Card>,
    pub was_lie: bool,
    pub challenged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenger_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_correct: Option<bool>,
    #[serde(default)]
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_reasoning: Option<String>,
    pub pile_after_turn: u32,
    #[serde(default)]
    pub hand_sizes_after_turn: HashMap<String, u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_response_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_token_usage: Option<TokenUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_response_time_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_token_usage: Option<TokenUsage>,
}

/// Seat-to-model binding for one game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub id: String,
    pub model_id: String,
}

/// A completed game as logged by the tournament runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLog {
    pub game_id: String,
    pub experiment_id: ExperimentId,
    pub players: Vec<PlayerRef>,
    pub turns: Vec<Turn>,
    /// Player id of the winner; `None` for aborted or drawn games.
    pub winner: Option<String>,
    pub total_turns: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_ms: u64,
}

impl GameLog {
    /// Player-id → model-id map for this game.
    pub fn model_map(&self) -> HashMap<&str, &str> {
        self.players
            .iter()
            .map(|p| (p.id.as_str(), p.model_id.as_str()))
            .collect()
    }

    /// Model id of the winner, if any.
    pub fn winner_model(&self) -> Option<&str> {
        let winner = self.winner.as_deref()?;
        self.players
            .iter()
            .find(|p| p.id == winner)
            .map(|p| p.model_id.as_str())
    }

    /// Seat id the given model plays in this game, if it participates.
    pub fn seat_of(&self, model_id: &str) -> Option<&str> {
        self.players
            .iter()
            .find(|p| p.model_id == model_id)
            .map(|p| p.id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_code() {
        let card = Card {
            rank: Rank::Ten,
            suit: Suit::Hearts,
        };
        assert_eq!(card.code(), "10H");

        let card = Card {
            rank: Rank::Ace,
            suit: Suit::Spades,
        };
        assert_eq!(card.code(), "AS");
    }

    #[test]
    fn test_rank_wire_format() {
        let rank: Rank = serde_json::from_str("\"10\"").unwrap();
        assert_eq!(rank, Rank::Ten);
        assert_eq!(serde_json::to_string(&Rank::Queen).unwrap(), "\"Q\"");
    }

    #[test]
    fn test_experiment_id_round_trip() {
        let id: ExperimentId = serde_json::from_str("3").unwrap();
        assert_eq!(id, ExperimentId::HonestyInstruction);
        assert_eq!(serde_json::to_string(&id).unwrap(), "3");
    }

    #[test]
    fn test_experiment_id_rejects_unknown() {
        let result: std::result::Result<ExperimentId, _> = serde_json::from_str("4");
        assert!(result.is_err(), "experiment id 4 should be rejected");
    }

    #[test]
    fn test_turn_deserializes_without_optional_fields() {
        let json = r#"{
            "turnNumber": 1,
            "playerId": "player-0",
            "claimedRank": "K",
            "claimedCount": 2,
            "actualCards": [{"rank": "K", "suit": "H"}, {"rank": "3", "suit": "C"}],
            "wasLie": true,
            "challenged": false,
            "reasoning": "bluffing early",
            "pileAfterTurn": 2,
            "handSizesAfterTurn": {"player-0": 11, "player-1": 13}
        }"#;

        let turn: Turn = serde_json::from_str(json).unwrap();
        assert!(turn.was_lie);
        assert!(turn.challenger_id.is_none());
        assert!(turn.challenge_correct.is_none());
        assert_eq!(turn.actual_cards.len(), 2);
    }

    #[test]
    fn test_game_log_model_map_and_winner() {
        let json = r#"{
            "gameId": "game-001",
            "experimentId": 1,
            "players": [
                {"id": "player-0", "modelId": "org/model-a"},
                {"id": "player-1", "modelId": "org/model-b"}
            ],
            "turns": [],
            "winner": "player-1",
            "totalTurns": 0,
            "startTime": "2025-01-15T10:00:00.000Z",
            "endTime": "2025-01-15T10:05:00.000Z",
            "durationMs": 300000
        }"#;

        let game: GameLog = serde_json::from_str(json).unwrap();
        assert_eq!(game.model_map().get("player-0"), Some(&"org/model-a"));
        assert_eq!(game.winner_model(), Some("org/model-b"));
        assert_eq!(game.seat_of("org/model-b"), Some("player-1"));
        assert_eq!(game.seat_of("org/model-z"), None);
        assert_eq!(game.duration_ms, 300000);
    }
}
