use chrono::NaiveDate;

use crate::error::SkipReason;
use crate::model::{GameDetail, GameId, GameNumber};
use crate::rivalry::RivalryTable;
use crate::scoring::analyze_scoring;
use crate::sources::GameDetailSource;

/// View count written when no recap video matched the game.
pub const MISSING_VIEWS: i64 = -1;

/// One output row: a regular-season game seen from the favored team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub game_id: GameId,
    pub season: String,
    pub game_number: GameNumber,
    pub game_date: NaiveDate,
    pub opponent: String,
    pub is_home: bool,
    pub favored_goals: u32,
    pub opponent_goals: u32,
    pub goal_differential: i64,
    pub is_loss: bool,
    pub max_blown_lead: u32,
    pub rivalry_magnitude: u32,
    pub views: i64,
}

pub struct GameRecordBuilder<'a> {
    favored: &'a str,
    rivalry: &'a RivalryTable,
}

impl<'a> GameRecordBuilder<'a> {
    pub fn new(favored: &'a str, rivalry: &'a RivalryTable) -> Self {
        Self { favored, rivalry }
    }

    pub fn fetch_and_build<D>(
        &self,
        details: &D,
        game_id: GameId,
        game_number: GameNumber,
        views: i64,
    ) -> Result<GameRecord, SkipReason>
    where
        D: GameDetailSource + ?Sized,
    {
        let detail = details
            .game_detail(game_id)
            .map_err(|err| SkipReason::from_detail_error(game_id, err))?;
        self.build(&detail, game_number, views)
    }

    pub fn build(
        &self,
        detail: &GameDetail,
        game_number: GameNumber,
        views: i64,
    ) -> Result<GameRecord, SkipReason> {
        let side = detail
            .orient(self.favored)
            .ok_or_else(|| SkipReason::MalformedDetail {
                game_id: detail.game_id,
                message: format!(
                    "{} is neither home ({}) nor away ({})",
                    self.favored, detail.home.abbrev, detail.away.abbrev
                ),
            })?;

        let summary = analyze_scoring(&detail.scoring, self.favored)
            .with_final_score(side.us.score, side.them.score);
        let opponent = side.them.abbrev.clone();
        let rivalry_magnitude = self.rivalry.magnitude(&opponent, detail.game_date);

        Ok(GameRecord {
            game_id: detail.game_id,
            season: detail.season.clone(),
            game_number,
            game_date: detail.game_date,
            opponent,
            is_home: side.is_home,
            favored_goals: summary.favored_goals,
            opponent_goals: summary.opponent_goals,
            goal_differential: summary.goal_differential(),
            is_loss: summary.is_loss(),
            max_blown_lead: summary.max_blown_lead,
            rivalry_magnitude,
            views,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ScoringEvent, TeamLine};

    fn detail(home: (&str, u32), away: (&str, u32), goals: &[&str]) -> GameDetail {
        GameDetail {
            game_id: 2023020045,
            season: "20232024".to_string(),
            game_date: NaiveDate::from_ymd_opt(2023, 10, 14).unwrap(),
            home: TeamLine {
                abbrev: home.0.to_string(),
                score: home.1,
            },
            away: TeamLine {
                abbrev: away.0.to_string(),
                score: away.1,
            },
            scoring: goals
                .iter()
                .enumerate()
                .map(|(sequence, team)| ScoringEvent {
                    team: (*team).to_string(),
                    sequence,
                })
                .collect(),
        }
    }

    #[test]
    fn away_game_is_oriented_to_favored_team() {
        let table = RivalryTable::builtin();
        let builder = GameRecordBuilder::new("TOR", &table);
        let d = detail(("BOS", 3), ("TOR", 5), &["TOR", "TOR", "TOR", "BOS", "BOS", "BOS", "TOR", "TOR"]);
        let record = builder.build(&d, 4, 1234).unwrap();
        assert!(!record.is_home);
        assert_eq!(record.opponent, "BOS");
        assert_eq!(record.favored_goals, 5);
        assert_eq!(record.opponent_goals, 3);
        assert_eq!(record.goal_differential, 2);
        assert!(!record.is_loss);
        assert_eq!(record.max_blown_lead, 3);
        assert_eq!(record.rivalry_magnitude, 4);
        assert_eq!(record.game_number, 4);
        assert_eq!(record.views, 1234);
    }

    #[test]
    fn shootout_win_uses_box_score() {
        let table = RivalryTable::builtin();
        let builder = GameRecordBuilder::new("TOR", &table);
        // 2-2 after overtime, TOR takes the shootout: the box score reads 3-2.
        let d = detail(("TOR", 3), ("SEA", 2), &["SEA", "TOR", "TOR", "SEA"]);
        let record = builder.build(&d, 10, MISSING_VIEWS).unwrap();
        assert!(record.is_home);
        assert_eq!((record.favored_goals, record.opponent_goals), (3, 2));
        assert!(!record.is_loss);
        assert_eq!(record.max_blown_lead, 1);
        assert_eq!(record.rivalry_magnitude, 1);
    }

    #[test]
    fn detail_without_favored_team_is_malformed() {
        let table = RivalryTable::builtin();
        let builder = GameRecordBuilder::new("TOR", &table);
        let d = detail(("BOS", 1), ("MTL", 0), &["BOS"]);
        let err = builder.build(&d, 1, MISSING_VIEWS).unwrap_err();
        assert!(matches!(err, SkipReason::MalformedDetail { game_id: 2023020045, .. }));
    }
}
