use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::records::GameRecord;

/// Output columns. Downstream notebooks read these by name and position.
pub const GAME_COLUMNS: [&str; 13] = [
    "game_id",
    "season",
    "game_number",
    "game_date",
    "opponent",
    "is_home",
    "leafs_goals",
    "opponent_goals",
    "goal_differential",
    "is_loss",
    "max_leafs_blown_leads",
    "opponent_hatred_score",
    "views",
];

pub fn write_games_csv(path: &Path, records: &[GameRecord]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("create games csv {}", path.display()))?;
    write_games(file, records)
}

pub fn write_games<W: Write>(writer: W, records: &[GameRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(GAME_COLUMNS).context("write games header")?;
    for record in records {
        writer
            .write_record(game_row(record))
            .with_context(|| format!("write game {}", record.game_id))?;
    }
    writer.flush().context("flush games csv")?;
    Ok(())
}

pub fn game_row(record: &GameRecord) -> [String; 13] {
    [
        record.game_id.to_string(),
        record.season.clone(),
        record.game_number.to_string(),
        record.game_date.format("%Y-%m-%d").to_string(),
        record.opponent.clone(),
        flag(record.is_home).to_string(),
        record.favored_goals.to_string(),
        record.opponent_goals.to_string(),
        record.goal_differential.to_string(),
        flag(record.is_loss).to_string(),
        record.max_blown_lead.to_string(),
        record.rivalry_magnitude.to_string(),
        record.views.to_string(),
    ]
}

// pandas reads these back as booleans.
fn flag(v: bool) -> &'static str {
    if v { "True" } else { "False" }
}
