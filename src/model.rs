use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type GameId = u64;
pub type GameNumber = u32;

/// NHL `gameType` for regular-season games (1 = preseason, 3 = playoffs).
pub const REGULAR_SEASON_GAME_TYPE: u8 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub game_id: GameId,
    pub game_type: u8,
}

impl ScheduleEntry {
    pub fn is_regular_season(&self) -> bool {
        self.game_type == REGULAR_SEASON_GAME_TYPE
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringEvent {
    /// Abbreviation of the team credited with the goal.
    pub team: String,
    pub sequence: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLine {
    pub abbrev: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDetail {
    pub game_id: GameId,
    pub season: String,
    pub game_date: NaiveDate,
    pub home: TeamLine,
    pub away: TeamLine,
    pub scoring: Vec<ScoringEvent>,
}

/// The detail seen from one team's bench.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Orientation<'a> {
    pub is_home: bool,
    pub us: &'a TeamLine,
    pub them: &'a TeamLine,
}

impl GameDetail {
    pub fn orient(&self, team: &str) -> Option<Orientation<'_>> {
        if self.home.abbrev == team {
            Some(Orientation {
                is_home: true,
                us: &self.home,
                them: &self.away,
            })
        } else if self.away.abbrev == team {
            Some(Orientation {
                is_home: false,
                us: &self.away,
                them: &self.home,
            })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoEntry {
    pub published: NaiveDate,
    pub title: String,
    pub views: u64,
    pub video_id: String,
}
