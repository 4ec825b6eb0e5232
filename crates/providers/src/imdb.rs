//! IMDb list fetcher.
//!
//! IMDb has no public API; list pages are fetched as HTML and `tt…` ids are
//! extracted in order of first appearance. Pagination continues while pages
//! keep yielding ids that have not been seen yet.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use collectarr_core::{ExternalId, ListSource, ListedItem, MediaKind};

use crate::ProviderError;
use crate::provider::ListProvider;

const LIST_BASE: &str = "https://www.imdb.com";
const MAX_LIST_PAGES: u32 = 25;

// IMDb rejects requests without a browser user agent.
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

static RE_TITLE_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"tt\d{5,}").unwrap());

static RE_LIST_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"ls\d+").unwrap());

pub struct ImdbList {
    client: reqwest::Client,
}

impl ImdbList {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Fetch a list's title ids, deduplicated, in list order.
    pub async fn list_ids(&self, value: &str) -> Result<Vec<String>, ProviderError> {
        let url = normalize_list_url(value).ok_or_else(|| {
            ProviderError::Provider(format!("unrecognized IMDb list `{value}`"))
        })?;

        let mut ids = Vec::new();
        let mut seen = HashSet::new();

        for page in 1..=MAX_LIST_PAGES {
            let page_str = page.to_string();
            debug!(url = %url, page, "IMDb list request");

            let resp = self
                .client
                .get(&url)
                .query(&[("page", page_str.as_str())])
                .header("User-Agent", USER_AGENT)
                .header("Accept-Language", "en-US,en;q=0.9")
                .send()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;

            if resp.status() == reqwest::StatusCode::NOT_FOUND {
                if page == 1 {
                    return Err(ProviderError::NotFound);
                }
                break;
            }
            if !resp.status().is_success() {
                return Err(ProviderError::Provider(format!(
                    "IMDb returned {}",
                    resp.status()
                )));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| ProviderError::Network(e.to_string()))?;

            let before = ids.len();
            collect_title_ids(&body, &mut seen, &mut ids);
            if ids.len() == before {
                break;
            }
        }

        Ok(ids)
    }
}

impl Default for ImdbList {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ListProvider for ImdbList {
    fn name(&self) -> &str {
        "imdb"
    }

    fn source(&self) -> ListSource {
        ListSource::Imdb
    }

    async fn fetch_list(&self, value: &str) -> Result<Vec<ListedItem>, ProviderError> {
        Ok(self
            .list_ids(value)
            .await?
            .into_iter()
            .map(|id| ListedItem {
                kind: MediaKind::Movie,
                title: None,
                year: None,
                ids: vec![ExternalId::Imdb(id)],
            })
            .collect())
    }
}

/// Accept a full list URL or a bare `ls…` id.
fn normalize_list_url(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        if trimmed.contains("/list/") {
            return Some(trimmed.trim_end_matches('/').to_string());
        }
        return None;
    }
    let id = RE_LIST_ID.find(trimmed)?.as_str();
    Some(format!("{LIST_BASE}/list/{id}"))
}

fn collect_title_ids(body: &str, seen: &mut HashSet<String>, ids: &mut Vec<String>) {
    for m in RE_TITLE_ID.find_iter(body) {
        if seen.insert(m.as_str().to_string()) {
            ids.push(m.as_str().to_string());
        }
    }
}
