use std::collections::{BTreeMap, HashMap};

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::model::{GameId, GameNumber, ScheduleEntry};
use crate::sources::ScheduleSource;

/// Ordinal regular-season game number → game id, for one season.
pub type SeasonIndex = BTreeMap<GameNumber, GameId>;

/// Numbers the regular-season games 1..=k in schedule order. Preseason and
/// playoff entries are skipped without consuming a number.
pub fn build_season_index(schedule: &[ScheduleEntry]) -> SeasonIndex {
    let mut index = SeasonIndex::new();
    let mut next: GameNumber = 1;
    for entry in schedule {
        if !entry.is_regular_season() {
            continue;
        }
        index.insert(next, entry.game_id);
        next += 1;
    }
    index
}

/// Fetches and indexes every season. Seasons are independent, so the schedule
/// requests fan out over a small rayon pool; any failed fetch fails the batch.
pub fn build_season_indices<S>(
    source: &S,
    seasons: &[String],
    parallelism: usize,
) -> Result<HashMap<String, SeasonIndex>>
where
    S: ScheduleSource + Sync + ?Sized,
{
    let pool = build_fetch_pool(parallelism);
    let fetched = with_fetch_pool(&pool, || {
        seasons
            .par_iter()
            .map(|season| {
                let schedule = source
                    .season_schedule(season)
                    .with_context(|| format!("fetch schedule for season {season}"))?;
                let index = build_season_index(&schedule);
                debug!(season = %season, scheduled = schedule.len(), "indexed schedule");
                Ok((season.clone(), index))
            })
            .collect::<Vec<Result<(String, SeasonIndex)>>>()
    });

    let mut out = HashMap::with_capacity(fetched.len());
    for item in fetched {
        let (season, index) = item?;
        info!(season = %season, games = index.len(), "built game map");
        out.insert(season, index);
    }
    Ok(out)
}

fn build_fetch_pool(parallelism: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallelism.clamp(1, 16))
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
