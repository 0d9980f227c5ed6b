use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Deserialize;

use crate::rivalry::RivalryTable;
use crate::title_parser::TIER_PREFIX;
use crate::video_index::TierSeasonTable;

pub const DEFAULT_FAVORED_TEAM: &str = "TOR";
pub const DEFAULT_SEASONS: &[&str] = &["20202021", "20212022", "20222023", "20232024", "20242025"];
pub const DEFAULT_NHL_API_BASE: &str = "https://api-web.nhle.com";
pub const DEFAULT_VIDEOS_CSV: &str = "data/lfr_videos.csv";
pub const DEFAULT_OUTPUT_CSV: &str = "data/games.csv";
pub const DEFAULT_YEARS_BACK: f64 = 6.0;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub favored_team: String,
    pub seasons: Vec<String>,
    pub tier_prefix: String,
    pub tiers: TierSeasonTable,
    pub rivalry: RivalryTable,
    pub videos_csv: PathBuf,
    pub output_csv: PathBuf,
    pub nhl_api_base: String,
    pub years_back: f64,
    pub fetch_parallelism: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            favored_team: DEFAULT_FAVORED_TEAM.to_string(),
            seasons: DEFAULT_SEASONS.iter().map(|s| s.to_string()).collect(),
            tier_prefix: TIER_PREFIX.to_string(),
            tiers: TierSeasonTable::builtin(),
            rivalry: RivalryTable::builtin(),
            videos_csv: PathBuf::from(DEFAULT_VIDEOS_CSV),
            output_csv: PathBuf::from(DEFAULT_OUTPUT_CSV),
            nhl_api_base: DEFAULT_NHL_API_BASE.to_string(),
            years_back: DEFAULT_YEARS_BACK,
            fetch_parallelism: 4,
        }
    }
}

/// Replacement lookup tables, read from `LFR_TABLES_JSON`.
#[derive(Debug, Default, Deserialize)]
pub struct TablesFile {
    #[serde(default)]
    pub tiers: Option<TierSeasonTable>,
    #[serde(default)]
    pub rivalry: Option<RivalryTable>,
}

impl PipelineConfig {
    /// Defaults overlaid with `LFR_*` environment variables. Call after the
    /// binaries have loaded `.env` files.
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        if let Some(team) = env_string("LFR_FAVORED_TEAM") {
            cfg.favored_team = team.to_ascii_uppercase();
        }
        if let Some(raw) = env_string("LFR_SEASONS") {
            let seasons = parse_seasons(&raw);
            if !seasons.is_empty() {
                cfg.seasons = seasons;
            }
        }
        if let Some(prefix) = env_string("LFR_TIER_PREFIX") {
            cfg.tier_prefix = prefix;
        }
        if let Some(path) = env_string("LFR_VIDEOS_CSV") {
            cfg.videos_csv = PathBuf::from(path);
        }
        if let Some(path) = env_string("LFR_OUTPUT_CSV") {
            cfg.output_csv = PathBuf::from(path);
        }
        if let Some(base) = env_string("NHL_API_BASE") {
            cfg.nhl_api_base = base.trim_end_matches('/').to_string();
        }
        cfg.years_back = env_string("LFR_YEARS_BACK")
            .and_then(|val| val.parse::<f64>().ok())
            .filter(|years| *years > 0.0)
            .unwrap_or(DEFAULT_YEARS_BACK);
        cfg.fetch_parallelism = env_string("FETCH_PARALLELISM")
            .and_then(|val| val.parse::<usize>().ok())
            .unwrap_or(4)
            .clamp(1, 16);
        if let Some(path) = env_string("LFR_TABLES_JSON") {
            cfg.apply_tables_file(Path::new(&path))?;
        }
        Ok(cfg)
    }

    pub fn apply_tables_file(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read tables file {}", path.display()))?;
        let tables = parse_tables_json(&raw)
            .with_context(|| format!("parse tables file {}", path.display()))?;
        self.apply_tables(tables);
        Ok(())
    }

    /// Oldest upload date worth fetching, `years_back` years before `now`.
    pub fn videos_since(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let out_of_range = || anyhow!("years back {} is out of range", self.years_back);
        let days = (self.years_back * 365.0).round();
        if !days.is_finite() {
            return Err(out_of_range());
        }
        let span = Duration::try_days(days as i64).ok_or_else(out_of_range)?;
        now.checked_sub_signed(span).ok_or_else(out_of_range)
    }

    pub fn apply_tables(&mut self, tables: TablesFile) {
        if let Some(tiers) = tables.tiers {
            self.tiers = tiers;
        }
        if let Some(rivalry) = tables.rivalry {
            self.rivalry = rivalry;
        }
    }
}

pub fn parse_tables_json(raw: &str) -> Result<TablesFile> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(TablesFile::default());
    }
    serde_json::from_str(trimmed).context("invalid tables json")
}

pub fn parse_seasons(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for part in raw.split([',', ';', ' ']) {
        let part = part.trim();
        if part.len() != 8 || !part.bytes().all(|b| b.is_ascii_digit()) {
            continue;
        }
        if !out.iter().any(|s| s == part) {
            out.push(part.to_string());
        }
    }
    out
}

/// NHL season id for a calendar date. Seasons open in October, so anything
/// from September on belongs to the season starting that year.
pub fn season_for_date(date: NaiveDate) -> String {
    let start = if date.month() >= 9 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}{}", start, start + 1)
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_seasons_keeps_order_and_drops_junk() {
        assert_eq!(
            parse_seasons("20232024, 20212022;bad 20232024 2022"),
            vec!["20232024".to_string(), "20212022".to_string()]
        );
        assert!(parse_seasons("").is_empty());
    }

    #[test]
    fn defaults_cover_included_seasons() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.favored_team, "TOR");
        let mapped: Vec<&str> = ["14", "15", "16", "17", "18"]
            .iter()
            .filter_map(|tier| cfg.tiers.season_for(tier))
            .collect();
        assert_eq!(mapped, cfg.seasons);
    }

    #[test]
    fn tables_file_replaces_only_given_tables() {
        let mut cfg = PipelineConfig::default();
        let tables = parse_tables_json(
            r#"{"rivalry": {"fixed": {"SEA": 3}, "overrides": {}}}"#,
        )
        .unwrap();
        cfg.apply_tables(tables);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(cfg.rivalry.magnitude("SEA", day), 3);
        assert_eq!(cfg.rivalry.magnitude("BOS", day), 1);
        assert_eq!(cfg.tiers, TierSeasonTable::builtin());
    }

    #[test]
    fn season_for_date_rolls_over_in_september() {
        let day = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(season_for_date(day(2025, 11, 12)), "20252026");
        assert_eq!(season_for_date(day(2025, 4, 10)), "20242025");
        assert_eq!(season_for_date(day(2025, 9, 1)), "20252026");
    }

    #[test]
    fn empty_tables_json_is_a_no_op() {
        let tables = parse_tables_json("  ").unwrap();
        assert!(tables.tiers.is_none());
        assert!(tables.rivalry.is_none());
    }

    #[test]
    fn videos_since_counts_back_whole_days() {
        let now = DateTime::parse_from_rfc3339("2025-11-12T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let cfg = PipelineConfig {
            years_back: 2.0,
            ..PipelineConfig::default()
        };
        let since = cfg.videos_since(now).unwrap();
        assert_eq!(now - since, Duration::days(730));
    }

    #[test]
    fn huge_years_back_is_an_error() {
        let now = Utc::now();
        for years_back in [1e9, 1e300, f64::INFINITY] {
            let cfg = PipelineConfig {
                years_back,
                ..PipelineConfig::default()
            };
            let err = cfg.videos_since(now).unwrap_err();
            assert!(err.to_string().contains("out of range"));
        }
    }
}
