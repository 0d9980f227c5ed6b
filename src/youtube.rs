use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::http_client::http_client;
use crate::model::VideoEntry;
use crate::sources::VideoSource;

const YOUTUBE_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
/// Upper bound the Data API accepts for both `maxResults` and `id=` lists.
pub const PAGE_SIZE: usize = 50;
pub const DEFAULT_CHANNEL_HANDLE: &str = "SteveDangle";

/// Lists a channel's uploads with view counts via the YouTube Data API v3.
///
/// Requests carry the API key in the query string, so they skip the shared
/// HTTP cache.
pub struct YoutubeClient {
    client: &'static Client,
    api_key: String,
    channel_handle: String,
}

impl YoutubeClient {
    pub fn new(api_key: impl Into<String>, channel_handle: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
            channel_handle: channel_handle.into(),
        })
    }

    /// Reads `YOUTUBE_API_KEY` and `LFR_CHANNEL_HANDLE`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("YOUTUBE_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "set YOUTUBE_API_KEY in .env or your environment; \
                     get a key at https://console.cloud.google.com/apis/credentials"
                )
            })?;
        let handle = std::env::var("LFR_CHANNEL_HANDLE")
            .ok()
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CHANNEL_HANDLE.to_string());
        Self::new(api_key.trim(), handle.trim())
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        let url = format!("{YOUTUBE_API_BASE}/{endpoint}");
        let resp = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .with_context(|| format!("{endpoint} request failed"))?;
        let status = resp.status();
        let body = resp.text().context("failed reading body")?;
        if !status.is_success() {
            return Err(anyhow!("{endpoint}: http {status}: {body}"));
        }
        serde_json::from_str(body.trim()).with_context(|| format!("invalid {endpoint} json"))
    }

    fn uploads_playlist(&self) -> Result<String> {
        let resp: ChannelList = self.get_json(
            "channels",
            &[
                ("part", "contentDetails"),
                ("forHandle", self.channel_handle.as_str()),
            ],
        )?;
        resp.items
            .into_iter()
            .next()
            .map(|c| c.content_details.related_playlists.uploads)
            .ok_or_else(|| anyhow!("no channel found for handle: {}", self.channel_handle))
    }

    fn playlist_videos(&self, playlist_id: &str, since: DateTime<Utc>) -> Result<Vec<PendingVideo>> {
        let max_results = PAGE_SIZE.to_string();
        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![
                ("part", "snippet"),
                ("playlistId", playlist_id),
                ("maxResults", max_results.as_str()),
            ];
            if let Some(token) = page_token.as_deref() {
                query.push(("pageToken", token));
            }
            let page: PlaylistPage = self.get_json("playlistItems", &query)?;
            let (kept, all_before_cutoff) = collect_page(page.items, since);
            debug!(kept = kept.len(), "playlist page");
            videos.extend(kept);

            // Uploads come newest first; a page entirely older than the cutoff ends it.
            if all_before_cutoff {
                break;
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(videos)
    }

    fn view_counts(&self, ids: &[String]) -> Result<HashMap<String, u64>> {
        let mut out = HashMap::with_capacity(ids.len());
        for batch in ids.chunks(PAGE_SIZE) {
            let joined = batch.join(",");
            let resp: VideoList = self.get_json("videos", &[("part", "statistics"), ("id", joined.as_str())])?;
            out.extend(view_counts_from(resp));
        }
        Ok(out)
    }
}

impl VideoSource for YoutubeClient {
    fn channel_videos(&self, since: DateTime<Utc>) -> Result<Vec<VideoEntry>> {
        let playlist = self.uploads_playlist()?;
        let pending = self.playlist_videos(&playlist, since)?;
        let ids: Vec<String> = pending.iter().map(|v| v.video_id.clone()).collect();
        let views = self.view_counts(&ids)?;
        info!(videos = pending.len(), "fetched channel uploads");

        let mut out: Vec<(DateTime<Utc>, VideoEntry)> = pending
            .into_iter()
            .map(|v| {
                let entry = VideoEntry {
                    published: v.published_at.date_naive(),
                    views: views.get(&v.video_id).copied().unwrap_or(0),
                    title: v.title,
                    video_id: v.video_id,
                };
                (v.published_at, entry)
            })
            .collect();
        out.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(out.into_iter().map(|(_, entry)| entry).collect())
    }
}

#[derive(Debug, Deserialize)]
struct ChannelList {
    #[serde(default)]
    items: Vec<Channel>,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "contentDetails")]
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    #[serde(rename = "relatedPlaylists")]
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaylistItem {
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
struct Snippet {
    #[serde(rename = "publishedAt")]
    published_at: Option<DateTime<Utc>>,
    title: String,
    #[serde(rename = "resourceId")]
    resource_id: ResourceId,
}

#[derive(Debug, Deserialize)]
struct ResourceId {
    #[serde(rename = "videoId")]
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideoList {
    #[serde(default)]
    items: Vec<VideoStats>,
}

#[derive(Debug, Deserialize)]
struct VideoStats {
    id: String,
    #[serde(default)]
    statistics: Option<Statistics>,
}

#[derive(Debug, Deserialize)]
struct Statistics {
    #[serde(rename = "viewCount")]
    view_count: Option<String>,
}

#[derive(Debug, Clone)]
struct PendingVideo {
    video_id: String,
    title: String,
    published_at: DateTime<Utc>,
}

/// Keeps items published at or after `since`. The flag is true when the page
/// had items and none of them made the cut.
fn collect_page(items: Vec<PlaylistItem>, since: DateTime<Utc>) -> (Vec<PendingVideo>, bool) {
    let had_items = !items.is_empty();
    let kept: Vec<PendingVideo> = items
        .into_iter()
        .filter_map(|item| {
            let published_at = item.snippet.published_at?;
            (published_at >= since).then(|| PendingVideo {
                video_id: item.snippet.resource_id.video_id,
                title: item.snippet.title,
                published_at,
            })
        })
        .collect();
    let all_before_cutoff = had_items && kept.is_empty();
    (kept, all_before_cutoff)
}

fn view_counts_from(resp: VideoList) -> impl Iterator<Item = (String, u64)> {
    resp.items.into_iter().map(|item| {
        let views = item
            .statistics
            .and_then(|s| s.view_count)
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(0);
        (item.id, views)
    })
}
