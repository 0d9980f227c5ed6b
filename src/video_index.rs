use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LookupFailure, TitleParseError};
use crate::model::{GameNumber, VideoEntry};
use crate::title_parser::parse_title_with_prefix;

/// Recap-series tier number → NHL season id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierSeasonTable(BTreeMap<String, String>);

impl TierSeasonTable {
    pub fn builtin() -> Self {
        [
            ("14", "20202021"),
            ("15", "20212022"),
            ("16", "20222023"),
            ("17", "20232024"),
            ("18", "20242025"),
            ("19", "20252026"),
        ]
        .into_iter()
        .collect()
    }

    pub fn season_for(&self, tier: &str) -> Option<&str> {
        self.0.get(tier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for TierSeasonTable {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(tier, season)| (tier.to_string(), season.to_string()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedVideo {
    pub video_id: String,
    pub published: NaiveDate,
    pub reason: TitleParseError,
}

/// Season → game number → view count, plus the entries whose titles did not
/// follow the naming convention.
#[derive(Debug, Clone, Default)]
pub struct VideoIndex {
    seasons: HashMap<String, BTreeMap<GameNumber, u64>>,
    skipped: Vec<SkippedVideo>,
}

impl VideoIndex {
    pub fn views(&self, season: &str, game_number: GameNumber) -> Option<u64> {
        self.seasons.get(season)?.get(&game_number).copied()
    }

    pub fn season(&self, season: &str) -> Option<&BTreeMap<GameNumber, u64>> {
        self.seasons.get(season)
    }

    pub fn skipped(&self) -> &[SkippedVideo] {
        &self.skipped
    }

    pub fn len(&self) -> usize {
        self.seasons.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Indexes recap videos by (season, game number).
///
/// Titles that don't parse are logged and skipped. A tier missing from
/// `tiers` aborts the whole build, since the table is meant to cover every
/// tier the channel has used. When two videos claim the same game, the later
/// one in `entries` wins.
pub fn build_video_index(
    entries: &[VideoEntry],
    tiers: &TierSeasonTable,
    tier_prefix: &str,
) -> Result<VideoIndex, LookupFailure> {
    let mut index = VideoIndex::default();

    for entry in entries {
        let parsed = match parse_title_with_prefix(&entry.title, tier_prefix) {
            Ok(parsed) => parsed,
            Err(reason) => {
                warn!(video_id = %entry.video_id, "{reason}");
                index.skipped.push(SkippedVideo {
                    video_id: entry.video_id.clone(),
                    published: entry.published,
                    reason,
                });
                continue;
            }
        };

        let Some(season) = tiers.season_for(&parsed.tier) else {
            return Err(LookupFailure {
                tier: parsed.tier,
                video_id: entry.video_id.clone(),
                title: entry.title.clone(),
            });
        };

        let previous = index
            .seasons
            .entry(season.to_string())
            .or_default()
            .insert(parsed.game_number, entry.views);
        if let Some(previous) = previous {
            debug!(
                season,
                game_number = parsed.game_number,
                previous,
                views = entry.views,
                "duplicate recap, keeping the later entry"
            );
        }
    }

    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TitleField;
    use crate::title_parser::TIER_PREFIX;

    fn video(title: &str, views: u64) -> VideoEntry {
        VideoEntry {
            published: NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            title: title.to_string(),
            views,
            video_id: format!("id-{views}"),
        }
    }

    #[test]
    fn tier_fifteen_precedes_tier_sixteen() {
        let table = TierSeasonTable::builtin();
        assert_eq!(table.season_for("15"), Some("20212022"));
        assert_eq!(table.season_for("16"), Some("20222023"));
        assert_eq!(table.len(), 6);
    }

    #[test]
    fn indexes_by_season_and_game() {
        let entries = vec![
            video("LFR15 - Game 15 - Red (Light) - CGY 1, TOR 2 (OT)", 90_000),
            video("LFR16 - Game 1 - Opener - MTL 2, TOR 5", 120_000),
        ];
        let index = build_video_index(&entries, &TierSeasonTable::builtin(), TIER_PREFIX).unwrap();
        assert_eq!(index.views("20212022", 15), Some(90_000));
        assert_eq!(index.views("20222023", 1), Some(120_000));
        assert_eq!(index.views("20222023", 2), None);
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn bad_titles_are_skipped_not_fatal() {
        let entries = vec![
            video("LFR17 - Trade Deadline Special", 5),
            video("LFR17 - Game 4 - TOR 3, OTT 1", 6),
        ];
        let index = build_video_index(&entries, &TierSeasonTable::builtin(), TIER_PREFIX).unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(index.skipped().len(), 1);
        assert_eq!(index.skipped()[0].video_id, "id-5");
        assert_eq!(index.skipped()[0].reason.field, TitleField::GameNumber);
    }

    #[test]
    fn duplicates_keep_the_last_entry() {
        let entries = vec![
            video("LFR18 - Game 9 - first upload", 10),
            video("LFR18 - Game 9 - reupload", 20),
        ];
        let index = build_video_index(&entries, &TierSeasonTable::builtin(), TIER_PREFIX).unwrap();
        assert_eq!(index.views("20242025", 9), Some(20));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn unknown_tier_is_a_lookup_failure() {
        let entries = vec![
            video("LFR18 - Game 9 - fine", 10),
            video("LFR7 - Game 2 - ancient history", 20),
        ];
        let err = build_video_index(&entries, &TierSeasonTable::builtin(), TIER_PREFIX).unwrap_err();
        assert_eq!(err.tier, "7");
        assert_eq!(err.video_id, "id-20");
    }

    #[test]
    fn table_deserializes_from_plain_map() {
        let table: TierSeasonTable = serde_json::from_str(r#"{"20": "20262027"}"#).unwrap();
        assert_eq!(table.season_for("20"), Some("20262027"));
    }
}
