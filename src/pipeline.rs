use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::PipelineConfig;
use crate::error::SkipReason;
use crate::model::{GameId, GameNumber, VideoEntry};
use crate::records::{GameRecord, GameRecordBuilder, MISSING_VIEWS};
use crate::season_index::{SeasonIndex, build_season_indices};
use crate::sources::{GameDetailSource, ScheduleSource};
use crate::video_index::{VideoIndex, build_video_index};

/// What happened to one scheduled game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub season: String,
    pub game_number: GameNumber,
    pub game_id: GameId,
    pub result: Result<GameRecord, SkipReason>,
}

#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub outcomes: Vec<GameOutcome>,
    pub skipped_videos: usize,
}

impl PipelineReport {
    pub fn records(&self) -> impl Iterator<Item = &GameRecord> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&GameOutcome, &SkipReason)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|reason| (o, reason)))
    }

    pub fn into_records(self) -> Vec<GameRecord> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect()
    }
}

/// Joins the per-season game maps with the recap views.
///
/// Seasons come out in the order given, games in ascending game number. A game
/// with no recap gets `MISSING_VIEWS`; a game whose detail can't be fetched or
/// read is kept as a skipped outcome and the run moves on.
pub fn join_games<D>(
    seasons: &[String],
    season_indices: &HashMap<String, SeasonIndex>,
    videos: &VideoIndex,
    details: &D,
    builder: &GameRecordBuilder<'_>,
) -> Vec<GameOutcome>
where
    D: GameDetailSource + ?Sized,
{
    let mut outcomes = Vec::new();

    for season in seasons {
        let Some(index) = season_indices.get(season) else {
            warn!(season = %season, "no game map for season");
            continue;
        };

        let mut built = 0usize;
        for (&game_number, &game_id) in index {
            let views = videos
                .views(season, game_number)
                .map(|v| i64::try_from(v).unwrap_or(i64::MAX))
                .unwrap_or(MISSING_VIEWS);
            let result = builder.fetch_and_build(details, game_id, game_number, views);
            match &result {
                Ok(_) => built += 1,
                Err(reason) => warn!(
                    game_id,
                    season = %season,
                    game_number,
                    "skip game: {reason}"
                ),
            }
            outcomes.push(GameOutcome {
                season: season.clone(),
                game_number,
                game_id,
                result,
            });
        }
        info!(season = %season, built, scheduled = index.len(), "processed season");
    }

    outcomes
}

/// Runs the whole join: schedules → game maps, videos → view index, then one
/// record per regular-season game.
pub fn run_pipeline<S, D>(
    config: &PipelineConfig,
    schedule: &S,
    details: &D,
    videos: &[VideoEntry],
) -> Result<PipelineReport>
where
    S: ScheduleSource + Sync + ?Sized,
    D: GameDetailSource + ?Sized,
{
    let season_indices = build_season_indices(schedule, &config.seasons, config.fetch_parallelism)?;
    let video_index = build_video_index(videos, &config.tiers, &config.tier_prefix)
        .context("build video index")?;
    info!(
        matched = video_index.len(),
        skipped = video_index.skipped().len(),
        "built views map"
    );

    let builder = GameRecordBuilder::new(&config.favored_team, &config.rivalry);
    let outcomes = join_games(
        &config.seasons,
        &season_indices,
        &video_index,
        details,
        &builder,
    );

    Ok(PipelineReport {
        outcomes,
        skipped_videos: video_index.skipped().len(),
    })
}
