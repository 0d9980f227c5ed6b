use std::fmt;

use thiserror::Error;

use crate::model::GameId;

/// Which part of a recap title could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleField {
    Tier,
    GameNumber,
}

impl fmt::Display for TitleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TitleField::Tier => f.write_str("tier number"),
            TitleField::GameNumber => f.write_str("game number"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {field} found in title {title:?}")]
pub struct TitleParseError {
    pub field: TitleField,
    pub title: String,
}

/// A parsed tier number with no entry in the tier→season table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("tier {tier} has no season mapping (video {video_id}, title {title:?})")]
pub struct LookupFailure {
    pub tier: String,
    pub video_id: String,
    pub title: String,
}

/// Failure reported by a game detail source.
#[derive(Debug, Error)]
pub enum DetailError {
    #[error("detail fetch failed: {0:#}")]
    Fetch(anyhow::Error),
    #[error("malformed detail payload: {0}")]
    Malformed(String),
}

/// Why a scheduled game produced no output row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("detail fetch failed for game {game_id}: {message}")]
    DetailFetch { game_id: GameId, message: String },
    #[error("malformed detail for game {game_id}: {message}")]
    MalformedDetail { game_id: GameId, message: String },
}

impl SkipReason {
    pub fn from_detail_error(game_id: GameId, err: DetailError) -> Self {
        match err {
            DetailError::Fetch(inner) => SkipReason::DetailFetch {
                game_id,
                message: format!("{inner:#}"),
            },
            DetailError::Malformed(message) => SkipReason::MalformedDetail { game_id, message },
        }
    }

    pub fn game_id(&self) -> GameId {
        match self {
            SkipReason::DetailFetch { game_id, .. } | SkipReason::MalformedDetail { game_id, .. } => {
                *game_id
            }
        }
    }
}
