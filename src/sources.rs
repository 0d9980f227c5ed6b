//! Seams to the outside world. The pipeline only talks to these traits; the
//! NHL and YouTube clients implement them for real runs and tests swap in
//! in-memory fakes.

use anyhow::Result;
use chrono::{DateTime, Utc};

use crate::error::DetailError;
use crate::model::{GameDetail, GameId, ScheduleEntry, VideoEntry};

pub trait ScheduleSource {
    /// Every game the team played in `season`, in schedule order.
    fn season_schedule(&self, season: &str) -> Result<Vec<ScheduleEntry>>;
}

pub trait GameDetailSource {
    fn game_detail(&self, game_id: GameId) -> Result<GameDetail, DetailError>;
}

pub trait VideoSource {
    fn channel_videos(&self, since: DateTime<Utc>) -> Result<Vec<VideoEntry>>;
}
