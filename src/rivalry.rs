use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MAGNITUDE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RivalryOverride {
    pub date: NaiveDate,
    pub magnitude: u32,
}

/// How much the fan base dislikes each opponent.
///
/// `fixed` entries hold regardless of date and win over `overrides`.
/// Override lists are scanned in the order they were declared; the first entry
/// dated strictly before the game applies. Lists are never re-sorted, so a list
/// declared oldest-first will keep answering with the oldest qualifying entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RivalryTable {
    #[serde(default)]
    pub fixed: HashMap<String, u32>,
    #[serde(default)]
    pub overrides: HashMap<String, Vec<RivalryOverride>>,
    #[serde(default = "default_magnitude")]
    pub default_magnitude: u32,
}

fn default_magnitude() -> u32 {
    DEFAULT_MAGNITUDE
}

impl Default for RivalryTable {
    fn default() -> Self {
        Self {
            fixed: HashMap::new(),
            overrides: HashMap::new(),
            default_magnitude: DEFAULT_MAGNITUDE,
        }
    }
}

impl RivalryTable {
    /// The Leafs table: division rivals and old playoff grudges.
    pub fn builtin() -> Self {
        let fixed = [
            ("BOS", 4),
            ("MTL", 4),
            ("OTT", 3),
            ("DET", 2),
            ("NYR", 2),
            ("EDM", 2),
            ("CHI", 2),
            ("BUF", 2),
            ("VAN", 2),
            ("WPG", 2),
            ("CGY", 2),
            ("WSH", 2),
            ("VGK", 2),
            ("NYI", 2),
        ]
        .into_iter()
        .map(|(team, magnitude)| (team.to_string(), magnitude))
        .collect();

        let mut overrides = HashMap::new();
        overrides.insert(
            "FLA".to_string(),
            vec![override_on(2025, 5, 18, 4), override_on(2023, 5, 12, 2)],
        );
        overrides.insert("TBL".to_string(), vec![override_on(2022, 4, 23, 3)]);

        Self {
            fixed,
            overrides,
            default_magnitude: DEFAULT_MAGNITUDE,
        }
    }

    pub fn magnitude(&self, opponent: &str, game_date: NaiveDate) -> u32 {
        if let Some(fixed) = self.fixed.get(opponent) {
            return *fixed;
        }
        self.overrides
            .get(opponent)
            .and_then(|list| list.iter().find(|o| o.date < game_date))
            .map(|o| o.magnitude)
            .unwrap_or(self.default_magnitude)
    }
}

fn override_on(y: i32, m: u32, d: u32, magnitude: u32) -> RivalryOverride {
    RivalryOverride {
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        magnitude,
    }
}
