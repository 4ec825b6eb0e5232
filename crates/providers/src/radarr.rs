//! Radarr client for handing off missing movies.
//!
//! Uses Radarr API v3. Adding a movie is a lookup followed by a POST of the
//! looked-up object with the configured quality profile and root folder.

use tracing::debug;

use collectarr_config::RadarrConfig;

use crate::ProviderError;

/// Result of an add request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    /// Radarr already tracks the movie.
    AlreadyPresent,
}

pub struct RadarrClient {
    base_url: String,
    api_key: String,
    quality_profile_id: i64,
    root_folder_path: String,
    client: reqwest::Client,
}

impl RadarrClient {
    pub fn new(config: &RadarrConfig) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.token.clone(),
            quality_profile_id: config.quality_profile_id,
            root_folder_path: config.root_folder_path.clone(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn add_movie(&self, tmdb_id: u64) -> Result<AddOutcome, ProviderError> {
        let mut movie = self.lookup(tmdb_id).await?;

        let Some(body) = movie.as_object_mut() else {
            return Err(ProviderError::Provider(
                "radarr lookup returned no movie".to_string(),
            ));
        };
        body.insert(
            "qualityProfileId".to_string(),
            serde_json::json!(self.quality_profile_id),
        );
        body.insert(
            "rootFolderPath".to_string(),
            serde_json::json!(self.root_folder_path),
        );
        body.insert("monitored".to_string(), serde_json::json!(true));
        body.insert(
            "addOptions".to_string(),
            serde_json::json!({ "searchForMovie": true }),
        );

        let url = format!("{}/api/v3/movie", self.base_url);
        debug!(url = %url, tmdb_id, "radarr add");

        let resp = self
            .client
            .post(&url)
            .header("X-Api-Key", self.api_key.as_str())
            .json(&movie)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        match resp.status().as_u16() {
            200 | 201 => Ok(AddOutcome::Added),
            400 => Ok(AddOutcome::AlreadyPresent),
            other => Err(ProviderError::Provider(format!("radarr returned {other}"))),
        }
    }

    async fn lookup(&self, tmdb_id: u64) -> Result<serde_json::Value, ProviderError> {
        let url = format!("{}/api/v3/movie/lookup/tmdb", self.base_url);
        let tmdb_id = tmdb_id.to_string();

        let resp = self
            .client
            .get(&url)
            .header("X-Api-Key", self.api_key.as_str())
            .query(&[("tmdbId", tmdb_id.as_str())])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "radarr returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))
    }
}
