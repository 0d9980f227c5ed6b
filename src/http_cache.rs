use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use reqwest::header::{ETAG, HeaderMap, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const CACHE_DIR: &str = "lfr_pipeline";
const RESPONSES_DIR: &str = "responses";
const MAX_KEY_LEN: usize = 180;

static STORE: OnceCell<Option<ResponseStore>> = OnceCell::new();

/// How a cached response may be reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Serve a stored body without touching the network. Finished games and
    /// past schedules don't change.
    PreferCache,
    /// Always ask the server, sending the stored validators.
    Revalidate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub body: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

/// One JSON file per URL under a cache directory.
#[derive(Debug, Clone)]
pub struct ResponseStore {
    dir: PathBuf,
}

impl ResponseStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(url)))
    }

    /// Missing, unreadable and stale-format files all read as a miss.
    pub fn load(&self, url: &str) -> Option<CachedResponse> {
        let raw = fs::read_to_string(self.path_for(url)).ok()?;
        let entry = serde_json::from_str::<CachedResponse>(&raw).ok()?;
        (entry.url == url).then_some(entry)
    }

    pub fn store(&self, entry: &CachedResponse) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("create cache dir {}", self.dir.display()))?;
        let path = self.path_for(&entry.url);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(entry).context("serialize cached response")?;
        fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("replace {}", path.display()))?;
        Ok(())
    }
}

/// Filesystem-safe name for a URL. Query strings are kept so distinct pages
/// don't collide.
pub fn cache_key(url: &str) -> String {
    let trimmed = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let mut key: String = trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '.' { c } else { '_' })
        .collect();
    if key.len() > MAX_KEY_LEN {
        key.truncate(MAX_KEY_LEN);
    }
    key
}

/// What the server answered for one conditional request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fetched {
    NotModified,
    Body {
        body: String,
        etag: Option<String>,
        last_modified: Option<String>,
    },
}

pub fn fetch_json_cached(client: &Client, url: &str, policy: CachePolicy) -> Result<String> {
    fetch_json_cached_if(client, url, policy, |_| true)
}

/// Like [`fetch_json_cached`], but only bodies accepted by `keep` are written
/// to disk or served from it. Anything else is fetched again on every call.
pub fn fetch_json_cached_if(
    client: &Client,
    url: &str,
    policy: CachePolicy,
    keep: impl Fn(&str) -> bool,
) -> Result<String> {
    resolve(shared_store(), url, policy, keep, |cached| {
        fetch(client, url, cached)
    })
}

/// Cache decision for one URL. `fetch` is called at most once, with the
/// entry whose validators should be sent.
pub fn resolve<F>(
    store: Option<&ResponseStore>,
    url: &str,
    policy: CachePolicy,
    keep: impl Fn(&str) -> bool,
    fetch: F,
) -> Result<String>
where
    F: FnOnce(Option<&CachedResponse>) -> Result<Fetched>,
{
    let Some(store) = store else {
        return match fetch(None)? {
            Fetched::Body { body, .. } => Ok(body),
            Fetched::NotModified => Err(anyhow!("server answered 304 for {url} but nothing is cached")),
        };
    };

    let cached = store.load(url).filter(|entry| keep(&entry.body));
    if policy == CachePolicy::PreferCache
        && let Some(entry) = cached.as_ref()
    {
        debug!(url, "serving cached response");
        return Ok(entry.body.clone());
    }

    match fetch(cached.as_ref())? {
        Fetched::NotModified => {
            let Some(mut entry) = cached else {
                return Err(anyhow!("server answered 304 for {url} but nothing is cached"));
            };
            debug!(url, "cached response still valid");
            entry.fetched_at = Utc::now();
            persist(store, &entry);
            Ok(entry.body)
        }
        Fetched::Body {
            body,
            etag,
            last_modified,
        } => {
            if keep(&body) {
                let entry = CachedResponse {
                    url: url.to_string(),
                    body,
                    etag,
                    last_modified,
                    fetched_at: Utc::now(),
                };
                persist(store, &entry);
                Ok(entry.body)
            } else {
                debug!(url, "response not cacheable yet");
                Ok(body)
            }
        }
    }
}

fn fetch(client: &Client, url: &str, cached: Option<&CachedResponse>) -> Result<Fetched> {
    let resp = send(client, url, cached)?;
    if resp.status() == StatusCode::NOT_MODIFIED {
        return Ok(Fetched::NotModified);
    }
    let headers = resp.headers().clone();
    let body = read_success(resp)?;
    Ok(Fetched::Body {
        body,
        etag: header_value(&headers, ETAG),
        last_modified: header_value(&headers, LAST_MODIFIED),
    })
}

fn send(client: &Client, url: &str, cached: Option<&CachedResponse>) -> Result<Response> {
    let mut req = client.get(url);
    if let Some(entry) = cached {
        if let Some(etag) = entry.etag.as_deref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = entry.last_modified.as_deref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }
    req.send().with_context(|| format!("GET {url}"))
}

fn read_success(resp: Response) -> Result<String> {
    let status = resp.status();
    let body = resp.text().context("read response body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status}: {body}"));
    }
    Ok(body)
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn persist(store: &ResponseStore, entry: &CachedResponse) {
    if let Err(err) = store.store(entry) {
        warn!("response for {} not cached: {err:#}", entry.url);
    }
}

fn shared_store() -> Option<&'static ResponseStore> {
    STORE
        .get_or_init(|| {
            if !cache_enabled() {
                return None;
            }
            app_cache_dir().map(|dir| ResponseStore::new(dir.join(RESPONSES_DIR)))
        })
        .as_ref()
}

/// Cache root, honoring `XDG_CACHE_HOME`.
pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(CACHE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn cache_enabled() -> bool {
    !matches!(
        std::env::var("LFR_HTTP_CACHE").ok().as_deref().map(str::trim),
        Some("off" | "0" | "false")
    )
}
