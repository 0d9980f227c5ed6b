use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use crate::model::VideoEntry;

pub const VIDEO_COLUMNS: [&str; 4] = ["date", "views", "title", "video_id"];
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn read_videos_csv(path: &Path) -> Result<Vec<VideoEntry>> {
    let file = File::open(path).with_context(|| format!("open videos csv {}", path.display()))?;
    read_videos(file).with_context(|| format!("read videos csv {}", path.display()))
}

/// Reads `date,views,title,video_id` rows. A header is recognized by a literal
/// `date` in the first column and skipped wherever it appears.
pub fn read_videos<R: Read>(reader: R) -> Result<Vec<VideoEntry>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut out = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("row {}", row_idx + 1))?;
        if record.get(0).map(str::trim) == Some(VIDEO_COLUMNS[0]) {
            continue;
        }
        if record.len() != VIDEO_COLUMNS.len() {
            return Err(anyhow!(
                "row {}: expected {} columns, found {}",
                row_idx + 1,
                VIDEO_COLUMNS.len(),
                record.len()
            ));
        }
        out.push(parse_video_record(&record).with_context(|| format!("row {}", row_idx + 1))?);
    }
    Ok(out)
}

fn parse_video_record(record: &csv::StringRecord) -> Result<VideoEntry> {
    let field = |idx: usize| record.get(idx).unwrap_or_default().trim();
    let published = NaiveDate::parse_from_str(field(0), DATE_FORMAT)
        .with_context(|| format!("bad date {:?}", field(0)))?;
    let views = field(1)
        .parse::<u64>()
        .with_context(|| format!("bad view count {:?}", field(1)))?;
    Ok(VideoEntry {
        published,
        views,
        title: field(2).to_string(),
        video_id: field(3).to_string(),
    })
}

/// Writes the recap videos (titles starting with `tier_prefix`) and returns how
/// many rows were written. Other uploads on the channel are dropped here.
pub fn write_videos_csv(path: &Path, videos: &[VideoEntry], tier_prefix: &str) -> Result<usize> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file =
        File::create(path).with_context(|| format!("create videos csv {}", path.display()))?;
    write_videos(file, videos, tier_prefix)
}

pub fn write_videos<W: Write>(writer: W, videos: &[VideoEntry], tier_prefix: &str) -> Result<usize> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(VIDEO_COLUMNS).context("write videos header")?;
    let mut written = 0usize;
    for video in videos.iter().filter(|v| v.title.starts_with(tier_prefix)) {
        writer
            .write_record([
                video.published.format(DATE_FORMAT).to_string(),
                video.views.to_string(),
                video.title.clone(),
                video.video_id.clone(),
            ])
            .with_context(|| format!("write video {}", video.video_id))?;
        written += 1;
    }
    writer.flush().context("flush videos csv")?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_quoted_titles_with_commas() {
        let raw = "date,views,title,video_id\n\
                   2025-11-12,111385,\"LFR19 - Game 17 - GAVIN - Maple Leafs 3, Bruins 5\",iqnUb6lNUjA\n";
        let videos = read_videos(raw.as_bytes()).unwrap();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].views, 111_385);
        assert_eq!(videos[0].title, "LFR19 - Game 17 - GAVIN - Maple Leafs 3, Bruins 5");
        assert_eq!(videos[0].video_id, "iqnUb6lNUjA");
        assert_eq!(videos[0].published, NaiveDate::from_ymd_opt(2025, 11, 12).unwrap());
    }

    #[test]
    fn headerless_file_is_fine() {
        let raw = "2022-01-03,5000,LFR15 - Game 30 - x,abc\n";
        assert_eq!(read_videos(raw.as_bytes()).unwrap().len(), 1);
    }

    #[test]
    fn bad_view_count_is_an_error() {
        let raw = "date,views,title,video_id\n2022-01-03,lots,LFR15 - Game 30 - x,abc\n";
        let err = read_videos(raw.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("row 2"));
    }

    #[test]
    fn short_row_is_an_error() {
        let raw = "2022-01-03,5000,LFR15 - Game 30 - x\n";
        assert!(read_videos(raw.as_bytes()).is_err());
    }

    #[test]
    fn writer_keeps_only_recaps() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let videos = vec![
            VideoEntry {
                published: day,
                title: "LFR18 - Game 50 - \"Quoted\", TOR 4, EDM 3".to_string(),
                views: 77,
                video_id: "v1".to_string(),
            },
            VideoEntry {
                published: day,
                title: "Leafs Morning Take".to_string(),
                views: 10,
                video_id: "v2".to_string(),
            },
        ];
        let mut buf = Vec::new();
        let written = write_videos(&mut buf, &videos, "LFR").unwrap();
        assert_eq!(written, 1);

        let back = read_videos(buf.as_slice()).unwrap();
        assert_eq!(back, vec![videos[0].clone()]);
    }
}
