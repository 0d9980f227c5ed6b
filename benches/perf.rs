use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use chrono::NaiveDate;

use lfr_pipeline::model::{ScoringEvent, VideoEntry};
use lfr_pipeline::rivalry::RivalryTable;
use lfr_pipeline::scoring::analyze_scoring;
use lfr_pipeline::title_parser::{TIER_PREFIX, parse_title};
use lfr_pipeline::video_index::{TierSeasonTable, build_video_index};

fn sample_videos(n: usize) -> Vec<VideoEntry> {
    let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default();
    (0..n)
        .map(|idx| {
            let tier = 14 + (idx % 6);
            let game = 1 + (idx % 82);
            let title = if idx % 10 == 0 {
                format!("LFR{tier} - Trade Deadline Special {idx}")
            } else {
                format!("LFR{tier} - Game {game} - Recap {idx} - TOR 3, BOS 2")
            };
            VideoEntry {
                published: day,
                title,
                views: (idx as u64) * 37,
                video_id: format!("v{idx}"),
            }
        })
        .collect()
}

fn sample_goals(n: usize) -> Vec<ScoringEvent> {
    (0..n)
        .map(|sequence| ScoringEvent {
            team: if sequence % 3 == 0 { "BOS" } else { "TOR" }.to_string(),
            sequence,
        })
        .collect()
}

fn bench_title_parse(c: &mut Criterion) {
    c.bench_function("title_parse", |b| {
        b.iter(|| {
            let parsed = parse_title(black_box("LFR15 - Game 15 - Red (Light) - CGY 1, TOR 2 (OT)"));
            black_box(parsed.is_ok());
        })
    });
}

fn bench_video_index(c: &mut Criterion) {
    let videos = sample_videos(600);
    let tiers = TierSeasonTable::builtin();
    c.bench_function("video_index_600", |b| {
        b.iter(|| {
            let index = build_video_index(black_box(&videos), &tiers, TIER_PREFIX);
            black_box(index.map(|i| i.len()).unwrap_or_default());
        })
    });
}

fn bench_scoring(c: &mut Criterion) {
    let goals = sample_goals(12);
    let rivalry = RivalryTable::builtin();
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap_or_default();
    c.bench_function("scoring_and_rivalry", |b| {
        b.iter(|| {
            let summary = analyze_scoring(black_box(&goals), "TOR");
            let magnitude = rivalry.magnitude(black_box("FLA"), day);
            black_box((summary.max_blown_lead, magnitude));
        })
    });
}

criterion_group!(benches, bench_title_parse, bench_video_index, bench_scoring);
criterion_main!(benches);
