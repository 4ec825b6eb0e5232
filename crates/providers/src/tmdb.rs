//! TMDB (The Movie Database) provider client.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs

use tracing::debug;

use collectarr_core::{ExternalId, ListSource, ListedItem, MediaKind};

use crate::ProviderError;
use crate::provider::ListProvider;

const BASE_URL: &str = "https://api.themoviedb.org/3";
const IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

pub struct TmdbClient {
    api_key: String,
    language: String,
    client: reqwest::Client,
}

/// What a `tmdb-list` config value points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListRef {
    List(u64),
    Collection(u64),
    /// A bare id; tried as a list first, then as a collection.
    Ambiguous(u64),
}

impl TmdbClient {
    pub fn new(api_key: String, language: String) -> Self {
        Self {
            api_key,
            language,
            client: reqwest::Client::new(),
        }
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, ProviderError> {
        let mut all_params = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        all_params.extend_from_slice(params);

        let url = format!("{BASE_URL}{path}");
        debug!(url = %url, "TMDB request");

        let resp = self
            .client
            .get(&url)
            .query(&all_params)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }

        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "TMDB returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))
    }

    /// Resolve a `tmdb-list` value (list URL, collection URL, or bare id)
    /// into its items.
    pub async fn list_items(&self, value: &str) -> Result<Vec<ListedItem>, ProviderError> {
        let list_ref = parse_list_value(value).ok_or_else(|| {
            ProviderError::Provider(format!("unrecognized TMDB list `{value}`"))
        })?;

        match list_ref {
            ListRef::List(id) => self.list_pages(id).await,
            ListRef::Collection(id) => self.collection_parts(id).await,
            ListRef::Ambiguous(id) => match self.list_pages(id).await {
                Err(ProviderError::NotFound) => self.collection_parts(id).await,
                other => other,
            },
        }
    }

    async fn list_pages(&self, id: u64) -> Result<Vec<ListedItem>, ProviderError> {
        let mut items = Vec::new();
        let mut page = 1u64;
        loop {
            let page_str = page.to_string();
            let data = self
                .get_json(&format!("/list/{id}"), &[("page", page_str.as_str())])
                .await?;
            items.extend(parse_list_entries(data["items"].as_array()));

            let total_pages = data["total_pages"].as_u64().unwrap_or(1);
            if page >= total_pages {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    async fn collection_parts(&self, id: u64) -> Result<Vec<ListedItem>, ProviderError> {
        let data = self.get_json(&format!("/collection/{id}"), &[]).await?;
        Ok(parse_list_entries(data["parts"].as_array()))
    }

    /// Summary text for a `tmdb-summary` detail: collection or movie
    /// `overview`, falling back to a person's `biography`.
    pub async fn summary(&self, id: &str) -> Result<String, ProviderError> {
        let lookups = [
            (format!("/collection/{id}"), "overview"),
            (format!("/movie/{id}"), "overview"),
            (format!("/person/{id}"), "biography"),
        ];
        for (path, field) in &lookups {
            if let Some(text) = self.lookup_field(path, field).await? {
                return Ok(text);
            }
        }
        Err(ProviderError::NotFound)
    }

    /// Full-size poster URL for a `tmdb-poster` detail, resolved through the
    /// same collection/movie/person chain as [`TmdbClient::summary`].
    pub async fn poster_url(&self, id: &str) -> Result<String, ProviderError> {
        let lookups = [
            (format!("/collection/{id}"), "poster_path"),
            (format!("/movie/{id}"), "poster_path"),
            (format!("/person/{id}"), "profile_path"),
        ];
        for (path, field) in &lookups {
            if let Some(poster_path) = self.lookup_field(path, field).await? {
                return Ok(format!("{IMAGE_BASE}/original{poster_path}"));
            }
        }
        Err(ProviderError::NotFound)
    }

    async fn lookup_field(
        &self,
        path: &str,
        field: &str,
    ) -> Result<Option<String>, ProviderError> {
        match self.get_json(path, &[]).await {
            Ok(data) => Ok(data[field]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())),
            Err(ProviderError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Map an IMDb id onto a TMDB movie, for Radarr hand-off.
    pub async fn find_movie_by_imdb(
        &self,
        imdb_id: &str,
    ) -> Result<Option<(u64, Option<String>)>, ProviderError> {
        let data = self
            .get_json(
                &format!("/find/{imdb_id}"),
                &[("external_source", "imdb_id")],
            )
            .await?;

        Ok(data["movie_results"]
            .as_array()
            .and_then(|results| results.first())
            .and_then(|movie| {
                movie["id"]
                    .as_u64()
                    .map(|id| (id, movie["title"].as_str().map(|t| t.to_string())))
            }))
    }
}

#[async_trait::async_trait]
impl ListProvider for TmdbClient {
    fn name(&self) -> &str {
        "tmdb"
    }

    fn source(&self) -> ListSource {
        ListSource::Tmdb
    }

    async fn fetch_list(&self, value: &str) -> Result<Vec<ListedItem>, ProviderError> {
        self.list_items(value).await
    }
}

fn parse_list_value(value: &str) -> Option<ListRef> {
    let trimmed = value.trim().trim_end_matches('/');

    if let Some(id) = id_after_marker(trimmed, "/collection/") {
        return Some(ListRef::Collection(id));
    }
    if let Some(id) = id_after_marker(trimmed, "/list/") {
        return Some(ListRef::List(id));
    }
    trimmed.parse().ok().map(ListRef::Ambiguous)
}

/// Parse the leading digits of the path segment after `marker`:
/// `…/collection/328-jurassic-park` yields 328.
fn id_after_marker(value: &str, marker: &str) -> Option<u64> {
    let rest = &value[value.find(marker)? + marker.len()..];
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn parse_list_entries(entries: Option<&Vec<serde_json::Value>>) -> Vec<ListedItem> {
    let Some(entries) = entries else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let id = entry["id"].as_u64()?;
            let kind = match entry["media_type"].as_str() {
                Some("tv") => MediaKind::Show,
                _ => MediaKind::Movie,
            };
            let (title_field, date_field) = match kind {
                MediaKind::Movie => ("title", "release_date"),
                MediaKind::Show => ("name", "first_air_date"),
            };
            Some(ListedItem {
                kind,
                title: entry[title_field].as_str().map(|t| t.to_string()),
                year: entry[date_field]
                    .as_str()
                    .and_then(|d| d.get(..4))
                    .and_then(|y| y.parse().ok()),
                ids: vec![ExternalId::Tmdb(id)],
            })
        })
        .collect()
}
