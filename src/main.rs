use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use lfr_pipeline::config::{PipelineConfig, parse_seasons, season_for_date};
use lfr_pipeline::games_csv::write_games_csv;
use lfr_pipeline::logging;
use lfr_pipeline::nhl::NhlClient;
use lfr_pipeline::pipeline::run_pipeline;
use lfr_pipeline::videos_csv::read_videos_csv;

fn main() -> Result<()> {
    logging::load_dotenv();
    logging::init();

    let mut config = PipelineConfig::from_env()?;
    if let Some(path) = arg_value("--videos") {
        config.videos_csv = PathBuf::from(path);
    }
    if let Some(path) = arg_value("--out") {
        config.output_csv = PathBuf::from(path);
    }
    if let Some(raw) = arg_value("--seasons") {
        let seasons = parse_seasons(&raw);
        if !seasons.is_empty() {
            config.seasons = seasons;
        }
    }
    if let Some(path) = arg_value("--tables") {
        config.apply_tables_file(&PathBuf::from(path))?;
    }

    let videos = read_videos_csv(&config.videos_csv)?;
    let nhl = NhlClient::new(config.nhl_api_base.clone(), config.favored_team.clone())
        .with_live_season(Some(season_for_date(Utc::now().date_naive())));

    let report = run_pipeline(&config, &nhl, &nhl, &videos)?;
    let skipped: Vec<String> = report
        .skipped()
        .map(|(outcome, reason)| {
            format!(
                "season {} game {} ({}): {reason}",
                outcome.season, outcome.game_number, outcome.game_id
            )
        })
        .collect();
    let skipped_videos = report.skipped_videos;
    let records = report.into_records();
    write_games_csv(&config.output_csv, &records)
        .with_context(|| format!("write {}", config.output_csv.display()))?;

    println!("Games table written");
    println!("Output: {}", config.output_csv.display());
    println!("Seasons: {}", config.seasons.join(", "));
    println!("Rows: {}", records.len());
    println!(
        "Missing recap views: {}",
        records.iter().filter(|r| r.views < 0).count()
    );
    println!("Unparsed video titles: {skipped_videos}");
    if !skipped.is_empty() {
        println!("Skipped games: {}", skipped.len());
        for line in skipped.iter().take(10) {
            println!("   - {line}");
        }
    }

    Ok(())
}

fn arg_value(name: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{name}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(raw) = arg.strip_prefix(&prefix) {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == name
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
