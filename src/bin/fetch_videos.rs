use std::path::PathBuf;

use anyhow::{Result, anyhow};
use chrono::Utc;

use lfr_pipeline::config::PipelineConfig;
use lfr_pipeline::logging;
use lfr_pipeline::sources::VideoSource;
use lfr_pipeline::videos_csv::write_videos_csv;
use lfr_pipeline::youtube::YoutubeClient;

fn main() -> Result<()> {
    logging::load_dotenv();
    logging::init();

    let mut config = PipelineConfig::from_env()?;
    if let Some(path) = parse_out_arg() {
        config.videos_csv = path;
    }
    if let Some(years) = parse_years_arg()? {
        config.years_back = years;
    }

    let youtube = YoutubeClient::from_env()?;
    let since = config.videos_since(Utc::now())?;
    let videos = youtube.channel_videos(since)?;
    let written = write_videos_csv(&config.videos_csv, &videos, &config.tier_prefix)?;

    println!("Video fetch complete");
    println!("Since: {}", since.format("%Y-%m-%d"));
    println!("Uploads seen: {}", videos.len());
    println!("Recaps written: {written}");
    println!("Output: {}", config.videos_csv.display());
    Ok(())
}

fn parse_out_arg() -> Option<PathBuf> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    for (idx, arg) in args.iter().enumerate() {
        if let Some(path) = arg.strip_prefix("--out=") {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return Some(PathBuf::from(trimmed));
            }
        }
        if arg == "--out"
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(PathBuf::from(next));
        }
    }
    None
}

fn parse_years_arg() -> Result<Option<f64>> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let raw = args.iter().enumerate().find_map(|(idx, arg)| {
        arg.strip_prefix("--years=")
            .map(str::to_string)
            .or_else(|| (arg == "--years").then(|| args.get(idx + 1).cloned()).flatten())
    });
    let Some(raw) = raw else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(years) if years > 0.0 => Ok(Some(years)),
        _ => Err(anyhow!("--years expects a positive number, got {raw:?}")),
    }
}
