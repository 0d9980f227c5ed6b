use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::DetailError;
use crate::http_cache::{CachePolicy, fetch_json_cached, fetch_json_cached_if};
use crate::http_client::http_client;
use crate::model::{GameDetail, GameId, ScheduleEntry, ScoringEvent, TeamLine};
use crate::sources::{GameDetailSource, ScheduleSource};

/// Client for the public NHL web API (`api-web.nhle.com`).
#[derive(Debug, Clone)]
pub struct NhlClient {
    base: String,
    team: String,
    /// Schedules for this season are revalidated on every run; older ones are
    /// served from cache.
    live_season: Option<String>,
}

impl NhlClient {
    pub fn new(base: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            team: team.into(),
            live_season: None,
        }
    }

    pub fn with_live_season(mut self, season: Option<String>) -> Self {
        self.live_season = season;
        self
    }

    pub fn schedule_url(&self, season: &str) -> String {
        format!(
            "{}/v1/club-schedule-season/{}/{}",
            self.base, self.team, season
        )
    }

    pub fn landing_url(&self, game_id: GameId) -> String {
        format!("{}/v1/gamecenter/{}/landing", self.base, game_id)
    }
}

impl ScheduleSource for NhlClient {
    fn season_schedule(&self, season: &str) -> Result<Vec<ScheduleEntry>> {
        let client = http_client()?;
        let policy = if self.live_season.as_deref() == Some(season) {
            CachePolicy::Revalidate
        } else {
            CachePolicy::PreferCache
        };
        let body = fetch_json_cached(client, &self.schedule_url(season), policy)
            .context("schedule request failed")?;
        parse_schedule_json(&body)
    }
}

impl GameDetailSource for NhlClient {
    fn game_detail(&self, game_id: GameId) -> Result<GameDetail, DetailError> {
        let client = http_client().map_err(DetailError::Fetch)?;
        let url = self.landing_url(game_id);
        let body = fetch_json_cached_if(client, &url, CachePolicy::PreferCache, is_final_landing)
            .context("landing request failed")
            .map_err(DetailError::Fetch)?;
        parse_game_detail_json(&body)
    }
}

#[derive(Debug, Deserialize)]
struct SchedulePayload {
    #[serde(default)]
    games: Vec<ScheduleGame>,
}

#[derive(Debug, Deserialize)]
struct ScheduleGame {
    id: u64,
    #[serde(rename = "gameType")]
    game_type: u8,
}

pub fn parse_schedule_json(raw: &str) -> Result<Vec<ScheduleEntry>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let payload: SchedulePayload =
        serde_json::from_str(trimmed).context("invalid schedule json")?;
    Ok(payload
        .games
        .into_iter()
        .map(|g| ScheduleEntry {
            game_id: g.id,
            game_type: g.game_type,
        })
        .collect())
}

/// Game states after which a landing payload no longer changes.
const FINAL_GAME_STATES: [&str; 2] = ["OFF", "FINAL"];

#[derive(Debug, Deserialize)]
struct LandingState {
    #[serde(rename = "gameState")]
    game_state: Option<String>,
}

/// True once the landing payload describes a finished game. Scheduled and
/// in-progress games must not be cached.
pub fn is_final_landing(raw: &str) -> bool {
    serde_json::from_str::<LandingState>(raw.trim())
        .ok()
        .and_then(|state| state.game_state)
        .is_some_and(|state| FINAL_GAME_STATES.contains(&state.as_str()))
}

#[derive(Debug, Deserialize)]
struct LandingPayload {
    id: u64,
    season: u64,
    #[serde(rename = "gameDate")]
    game_date: String,
    #[serde(rename = "homeTeam")]
    home_team: LandingTeam,
    #[serde(rename = "awayTeam")]
    away_team: LandingTeam,
    summary: Option<LandingSummary>,
}

#[derive(Debug, Deserialize)]
struct LandingTeam {
    abbrev: String,
    score: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LandingSummary {
    scoring: Option<Vec<LandingPeriod>>,
}

#[derive(Debug, Deserialize)]
struct LandingPeriod {
    #[serde(default)]
    goals: Vec<LandingGoal>,
}

#[derive(Debug, Deserialize)]
struct LandingGoal {
    #[serde(rename = "teamAbbrev")]
    team_abbrev: LocalizedName,
}

#[derive(Debug, Deserialize)]
struct LocalizedName {
    default: String,
}

/// Reads a gamecenter `landing` payload. Games without a final score or a
/// scoring summary (not yet played, postponed) are reported as malformed.
pub fn parse_game_detail_json(raw: &str) -> Result<GameDetail, DetailError> {
    let payload: LandingPayload = serde_json::from_str(raw.trim())
        .map_err(|err| DetailError::Malformed(format!("invalid landing json: {err}")))?;

    let game_date = NaiveDate::parse_from_str(&payload.game_date, "%Y-%m-%d").map_err(|err| {
        DetailError::Malformed(format!("bad gameDate {:?}: {err}", payload.game_date))
    })?;
    let home = team_line(payload.home_team, "home")?;
    let away = team_line(payload.away_team, "away")?;
    let periods = payload
        .summary
        .and_then(|s| s.scoring)
        .ok_or_else(|| DetailError::Malformed("missing summary.scoring".to_string()))?;

    let scoring = periods
        .into_iter()
        .flat_map(|period| period.goals)
        .enumerate()
        .map(|(sequence, goal)| ScoringEvent {
            team: goal.team_abbrev.default,
            sequence,
        })
        .collect();

    Ok(GameDetail {
        game_id: payload.id,
        season: payload.season.to_string(),
        game_date,
        home,
        away,
        scoring,
    })
}

fn team_line(team: LandingTeam, side: &str) -> Result<TeamLine, DetailError> {
    let score = team
        .score
        .ok_or_else(|| DetailError::Malformed(format!("{side} team {} has no score", team.abbrev)))?;
    Ok(TeamLine {
        abbrev: team.abbrev,
        score,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_cache::{Fetched, ResponseStore, resolve};

    #[test]
    fn urls_follow_web_api_layout() {
        let client = NhlClient::new("https://api-web.nhle.com/", "TOR");
        assert_eq!(
            client.schedule_url("20232024"),
            "https://api-web.nhle.com/v1/club-schedule-season/TOR/20232024"
        );
        assert_eq!(
            client.landing_url(2023020001),
            "https://api-web.nhle.com/v1/gamecenter/2023020001/landing"
        );
    }

    #[test]
    fn empty_schedule_body_is_empty() {
        assert!(parse_schedule_json("  null ").unwrap().is_empty());
        assert!(parse_schedule_json(r#"{"previousSeason": 20222023}"#).unwrap().is_empty());
    }

    #[test]
    fn unplayed_game_is_malformed() {
        let raw = r#"{
            "id": 2024020999, "season": 20242025, "gameDate": "2025-04-10",
            "homeTeam": {"abbrev": "TOR"}, "awayTeam": {"abbrev": "DET"}
        }"#;
        let err = parse_game_detail_json(raw).unwrap_err();
        assert!(matches!(err, DetailError::Malformed(msg) if msg.contains("no score")));
    }

    #[test]
    fn missing_summary_is_malformed() {
        let raw = r#"{
            "id": 1, "season": 20242025, "gameDate": "2025-04-10",
            "homeTeam": {"abbrev": "TOR", "score": 1}, "awayTeam": {"abbrev": "DET", "score": 0}
        }"#;
        assert!(matches!(
            parse_game_detail_json(raw),
            Err(DetailError::Malformed(_))
        ));
    }

    #[test]
    fn garbage_is_malformed_not_a_panic() {
        assert!(matches!(
            parse_game_detail_json("<html>502</html>"),
            Err(DetailError::Malformed(_))
        ));
    }

    #[test]
    fn only_finished_landings_are_final() {
        assert!(is_final_landing(r#"{"gameState": "OFF"}"#));
        assert!(is_final_landing(r#"{"id": 7, "gameState": "FINAL"}"#));
        assert!(!is_final_landing(r#"{"gameState": "LIVE"}"#));
        assert!(!is_final_landing(r#"{"gameState": "CRIT"}"#));
        assert!(!is_final_landing(r#"{"gameState": "FUT"}"#));
        assert!(!is_final_landing(r#"{"id": 7}"#));
        assert!(!is_final_landing("<html>502</html>"));
    }

    #[test]
    fn unplayed_landing_is_refetched_until_final() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResponseStore::new(dir.path());
        let url = NhlClient::new("http://127.0.0.1:9", "TOR").landing_url(7);
        let scheduled = r#"{
            "id": 7, "season": 20252026, "gameDate": "2025-10-08", "gameState": "FUT",
            "homeTeam": {"abbrev": "TOR"}, "awayTeam": {"abbrev": "MTL"}
        }"#;
        let finished = r#"{
            "id": 7, "season": 20252026, "gameDate": "2025-10-08", "gameState": "OFF",
            "homeTeam": {"abbrev": "TOR", "score": 5}, "awayTeam": {"abbrev": "MTL", "score": 2},
            "summary": {"scoring": [{"goals": [{"teamAbbrev": {"default": "TOR"}}]}]}
        }"#;
        let mut requests = 0;
        let mut run = |served: &str| {
            resolve(Some(&store), &url, CachePolicy::PreferCache, is_final_landing, |_| {
                requests += 1;
                Ok(Fetched::Body {
                    body: served.to_string(),
                    etag: None,
                    last_modified: None,
                })
            })
            .unwrap()
        };

        let before = run(scheduled);
        assert!(matches!(parse_game_detail_json(&before), Err(DetailError::Malformed(_))));

        let after = run(finished);
        let detail = parse_game_detail_json(&after).unwrap();
        assert_eq!((detail.home.score, detail.away.score), (5, 2));

        let again = run(scheduled);
        assert_eq!(again, finished);
        assert_eq!(requests, 2);
    }
}
