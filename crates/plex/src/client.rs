//! Plex HTTP client.
//!
//! Covers the handful of endpoints collection sync needs: section listing,
//! filtered item search, collection tagging, and the two collection edit
//! calls (summary, poster). Requests authenticate with the `X-Plex-Token`
//! query parameter and ask for JSON responses.

use std::time::Duration;

use tracing::debug;

use collectarr_core::{ExternalId, MediaKind};

use crate::PlexError;
use crate::guid;

const PLEX_TIMEOUT: Duration = Duration::from_secs(60);

/// Plex item type for collections in section edit calls.
const COLLECTION_TYPE: &str = "18";

pub struct PlexServer {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

/// A library section of a kind this tool understands.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub kind: MediaKind,
}

/// A library item with the provider ids extracted from its guids.
#[derive(Debug, Clone, PartialEq)]
pub struct LibraryItem {
    pub rating_key: String,
    pub title: String,
    pub year: Option<i32>,
    pub ids: Vec<ExternalId>,
}

/// A collection as returned by a section search with `type=18`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlexCollection {
    pub rating_key: String,
    pub title: String,
    pub subtype: MediaKind,
}

impl PlexServer {
    pub fn new(url: &str, token: &str) -> Result<Self, PlexError> {
        let client = reqwest::Client::builder()
            .timeout(PLEX_TIMEOUT)
            .build()
            .map_err(|e| PlexError::Network(e.to_string()))?;

        Ok(Self {
            base_url: url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, PlexError> {
        let mut all_params = vec![("X-Plex-Token", self.token.as_str())];
        all_params.extend_from_slice(params);

        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "plex request");

        let resp = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&all_params)
            .send()
            .await
            .map_err(|e| PlexError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PlexError::Server(resp.status().to_string()));
        }

        resp.json()
            .await
            .map_err(|e| PlexError::Parse(e.to_string()))
    }

    async fn put(&self, path: &str, params: &[(&str, &str)]) -> Result<(), PlexError> {
        let mut all_params = vec![("X-Plex-Token", self.token.as_str())];
        all_params.extend_from_slice(params);

        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "plex edit");

        let resp = self
            .client
            .put(&url)
            .query(&all_params)
            .send()
            .await
            .map_err(|e| PlexError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PlexError::Server(resp.status().to_string()));
        }
        Ok(())
    }

    async fn post(&self, path: &str, params: &[(&str, &str)]) -> Result<(), PlexError> {
        let mut all_params = vec![("X-Plex-Token", self.token.as_str())];
        all_params.extend_from_slice(params);

        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "plex post");

        let resp = self
            .client
            .post(&url)
            .query(&all_params)
            .send()
            .await
            .map_err(|e| PlexError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(PlexError::Server(resp.status().to_string()));
        }
        Ok(())
    }

    /// All movie/show sections on the server.
    pub async fn sections(&self) -> Result<Vec<Section>, PlexError> {
        let data = self.get_json("/library/sections", &[]).await?;
        let directories = data["MediaContainer"]["Directory"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(directories
            .iter()
            .filter_map(|d| {
                let kind = match d["type"].as_str() {
                    Some("movie") => MediaKind::Movie,
                    Some("show") => MediaKind::Show,
                    _ => return None,
                };
                Some(Section {
                    key: d["key"].as_str()?.to_string(),
                    title: d["title"].as_str()?.to_string(),
                    kind,
                })
            })
            .collect())
    }

    /// Find a section by title and kind.
    pub async fn find_section(&self, title: &str, kind: MediaKind) -> Result<Section, PlexError> {
        self.sections()
            .await?
            .into_iter()
            .find(|s| s.kind == kind && s.title == title)
            .ok_or_else(|| PlexError::LibraryNotFound(title.to_string()))
    }

    /// Every item of a section, with guids.
    pub async fn section_items(&self, section: &Section) -> Result<Vec<LibraryItem>, PlexError> {
        let data = self
            .get_json(
                &format!("/library/sections/{}/all", section.key),
                &[("includeGuids", "1")],
            )
            .await?;
        Ok(parse_items(&data))
    }

    /// Items matching one filter parameter plus any subfilters.
    pub async fn filter_items(
        &self,
        section: &Section,
        param: &str,
        value: &str,
        subfilters: &[(String, String)],
    ) -> Result<Vec<LibraryItem>, PlexError> {
        let converted: Vec<(String, &str)> = subfilters
            .iter()
            .map(|(name, v)| (subfilter_param(name), v.as_str()))
            .collect();

        let mut params = vec![("includeGuids", "1"), (param, value)];
        for (name, v) in &converted {
            params.push((name.as_str(), *v));
        }

        let data = self
            .get_json(&format!("/library/sections/{}/all", section.key), &params)
            .await?;
        Ok(parse_items(&data))
    }

    /// Resolve a tag (actor, genre, director, studio) to its numeric key by
    /// name. Matching is case-insensitive.
    pub async fn resolve_tag_key(
        &self,
        section: &Section,
        tag: &str,
        name: &str,
    ) -> Result<Option<String>, PlexError> {
        let data = self
            .get_json(&format!("/library/sections/{}/{tag}", section.key), &[])
            .await?;
        let directories = data["MediaContainer"]["Directory"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(directories
            .iter()
            .find(|d| {
                d["title"]
                    .as_str()
                    .is_some_and(|t| t.eq_ignore_ascii_case(name))
            })
            .and_then(|d| d["key"].as_str().map(|k| k.to_string())))
    }

    /// Tag an item with a collection name, creating the collection on first
    /// use.
    pub async fn add_to_collection(
        &self,
        section: &Section,
        rating_key: &str,
        kind: MediaKind,
        collection: &str,
    ) -> Result<(), PlexError> {
        let item_type = kind.plex_type().to_string();
        self.put(
            &format!("/library/sections/{}/all", section.key),
            &[
                ("type", item_type.as_str()),
                ("id", rating_key),
                ("collection[0].tag.tag", collection),
            ],
        )
        .await
    }

    /// Collections in a section carrying exactly the given title.
    pub async fn collections_named(
        &self,
        section: &Section,
        name: &str,
    ) -> Result<Vec<PlexCollection>, PlexError> {
        let data = self
            .get_json(
                &format!("/library/sections/{}/all", section.key),
                &[("type", COLLECTION_TYPE), ("title", name)],
            )
            .await?;
        let metadata = data["MediaContainer"]["Metadata"]
            .as_array()
            .cloned()
            .unwrap_or_default();

        Ok(metadata
            .iter()
            .filter(|m| m["title"].as_str() == Some(name))
            .filter_map(|m| {
                let subtype = match m["subtype"].as_str() {
                    Some("movie") => MediaKind::Movie,
                    Some("show") => MediaKind::Show,
                    _ => section.kind,
                };
                Some(PlexCollection {
                    rating_key: m["ratingKey"].as_str()?.to_string(),
                    title: name.to_string(),
                    subtype,
                })
            })
            .collect())
    }

    /// Update a collection's summary text.
    pub async fn set_collection_summary(
        &self,
        section: &Section,
        rating_key: &str,
        summary: &str,
    ) -> Result<(), PlexError> {
        self.put(
            &format!("/library/sections/{}/all", section.key),
            &[
                ("type", COLLECTION_TYPE),
                ("id", rating_key),
                ("summary.value", summary),
            ],
        )
        .await
    }

    /// Point a collection's poster at a remote image.
    pub async fn upload_poster(
        &self,
        rating_key: &str,
        poster_url: &str,
    ) -> Result<(), PlexError> {
        self.post(
            &format!("/library/metadata/{rating_key}/posters"),
            &[("url", poster_url)],
        )
        .await
    }
}

fn parse_items(data: &serde_json::Value) -> Vec<LibraryItem> {
    let metadata = data["MediaContainer"]["Metadata"]
        .as_array()
        .cloned()
        .unwrap_or_default();

    metadata
        .iter()
        .filter_map(|m| {
            Some(LibraryItem {
                rating_key: m["ratingKey"].as_str()?.to_string(),
                title: m["title"].as_str().unwrap_or("Unknown").to_string(),
                year: m["year"].as_i64().map(|y| y as i32),
                ids: guid::collect_ids(m),
            })
        })
        .collect()
}

/// Convert a config subfilter name to the Plex query parameter:
/// `audio-language` becomes `audioLanguage`.
fn subfilter_param(name: &str) -> String {
    let mut parts = name.split('-');
    let mut out = parts.next().unwrap_or_default().to_string();
    for part in parts {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
