//! Trakt provider client.
//!
//! Uses Trakt API v2. Every request carries the `trakt-api-version` and
//! `trakt-api-key` headers; user-scoped requests add a Bearer token. Tokens
//! are obtained with the device-code flow and kept fresh with the refresh
//! grant; the caller persists any new authorization into the config file.

use std::time::Duration;

use tracing::{debug, info, warn};

use collectarr_config::TraktAuthorization;
use collectarr_core::{ExternalId, ListSource, ListedItem, MediaKind};

use crate::ProviderError;
use crate::provider::ListProvider;

const BASE_URL: &str = "https://api.trakt.tv";
const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Refresh a day before the token actually expires.
const REFRESH_MARGIN_SECS: i64 = 86_400;

pub struct TraktClient {
    client_id: String,
    client_secret: String,
    authorization: Option<TraktAuthorization>,
    client: reqwest::Client,
}

#[derive(Debug, serde::Deserialize)]
struct DeviceCode {
    device_code: String,
    user_code: String,
    verification_url: String,
    expires_in: i64,
    interval: u64,
}

impl TraktClient {
    pub fn new(
        client_id: String,
        client_secret: String,
        authorization: Option<TraktAuthorization>,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            authorization,
            client: reqwest::Client::new(),
        }
    }

    pub fn authorization(&self) -> Option<&TraktAuthorization> {
        self.authorization.as_ref()
    }

    /// Refresh the stored token if it is about to expire.
    ///
    /// Returns the new authorization when one was obtained, so the caller can
    /// write it back to the config file. Errors with
    /// [`ProviderError::Auth`] when there is nothing usable to refresh.
    pub async fn refresh_if_needed(
        &mut self,
    ) -> Result<Option<TraktAuthorization>, ProviderError> {
        let Some(auth) = self.authorization.clone() else {
            return Err(ProviderError::Auth(
                "no trakt authorization in config".to_string(),
            ));
        };

        if !is_expired(&auth, chrono::Utc::now().timestamp()) {
            return Ok(None);
        }

        debug!("trakt token expired, refreshing");
        let body = serde_json::json!({
            "refresh_token": auth.refresh_token,
            "client_id": self.client_id,
            "client_secret": self.client_secret,
            "redirect_uri": REDIRECT_URI,
            "grant_type": "refresh_token",
        });

        let resp = self.post_json("/oauth/token", &body).await?;
        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::Auth(
                "trakt refused the refresh token".to_string(),
            ));
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "trakt returned {}",
                resp.status()
            )));
        }

        let new_auth: TraktAuthorization = resp
            .json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse token: {e}")))?;
        info!("trakt token refreshed");
        self.authorization = Some(new_auth.clone());
        Ok(Some(new_auth))
    }

    /// Run the device-code flow: print the verification URL and user code,
    /// then poll until the user approves or the code expires.
    pub async fn authenticate_device(&mut self) -> Result<TraktAuthorization, ProviderError> {
        let body = serde_json::json!({ "client_id": self.client_id });
        let resp = self.post_json("/oauth/device/code", &body).await?;
        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "trakt returned {}",
                resp.status()
            )));
        }
        let code: DeviceCode = resp
            .json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse device code: {e}")))?;

        info!(
            url = %code.verification_url,
            user_code = %code.user_code,
            "visit the URL and enter the code to authorize trakt access"
        );

        let deadline = chrono::Utc::now().timestamp() + code.expires_in;
        let mut interval = code.interval.max(1);
        let body = serde_json::json!({
            "code": code.device_code,
            "client_id": self.client_id,
            "client_secret": self.client_secret,
        });

        loop {
            tokio::time::sleep(Duration::from_secs(interval)).await;
            if chrono::Utc::now().timestamp() >= deadline {
                return Err(ProviderError::Auth("device code expired".to_string()));
            }

            let resp = self.post_json("/oauth/device/token", &body).await?;
            match resp.status().as_u16() {
                200 => {
                    let auth: TraktAuthorization = resp
                        .json()
                        .await
                        .map_err(|e| ProviderError::Provider(format!("parse token: {e}")))?;
                    info!("trakt authorization granted");
                    self.authorization = Some(auth.clone());
                    return Ok(auth);
                }
                // Authorization pending.
                400 => continue,
                404 => return Err(ProviderError::Auth("invalid device code".to_string())),
                409 => return Err(ProviderError::Auth("code already approved".to_string())),
                410 => return Err(ProviderError::Auth("device code expired".to_string())),
                418 => return Err(ProviderError::Auth("authorization denied".to_string())),
                429 => {
                    warn!("trakt asked to slow down device polling");
                    interval += 1;
                }
                other => {
                    return Err(ProviderError::Provider(format!("trakt returned {other}")));
                }
            }
        }
    }

    /// Items of a user list. The value is a list URL or a `user/slug` pair.
    pub async fn list_items(&self, value: &str) -> Result<Vec<ListedItem>, ProviderError> {
        let (user, slug) = parse_list_value(value).ok_or_else(|| {
            ProviderError::Provider(format!("unrecognized trakt list `{value}`"))
        })?;

        let data = self
            .get_json(&format!("/users/{user}/lists/{slug}/items"))
            .await?;
        Ok(parse_list_items(&data))
    }

    async fn get_json(&self, path: &str) -> Result<serde_json::Value, ProviderError> {
        let url = format!("{BASE_URL}{path}");
        debug!(url = %url, "trakt request");

        let mut req = self
            .client
            .get(&url)
            .header("trakt-api-version", "2")
            .header("trakt-api-key", self.client_id.as_str())
            .header("Content-Type", "application/json");
        if let Some(auth) = &self.authorization {
            req = req.header("Authorization", format!("Bearer {}", auth.access_token));
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound);
        }
        if !resp.status().is_success() {
            return Err(ProviderError::Provider(format!(
                "trakt returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Provider(format!("parse JSON: {e}")))
    }

    async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, ProviderError> {
        self.client
            .post(format!("{BASE_URL}{path}"))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))
    }
}

#[async_trait::async_trait]
impl ListProvider for TraktClient {
    fn name(&self) -> &str {
        "trakt"
    }

    fn source(&self) -> ListSource {
        ListSource::Trakt
    }

    async fn fetch_list(&self, value: &str) -> Result<Vec<ListedItem>, ProviderError> {
        self.list_items(value).await
    }
}

/// A token is expired once `created_at + expires_in` is within the refresh
/// margin of `now`.
fn is_expired(auth: &TraktAuthorization, now: i64) -> bool {
    auth.created_at + auth.expires_in - REFRESH_MARGIN_SECS <= now
}

/// Accept `https://trakt.tv/users/<user>/lists/<slug>` or `<user>/<slug>`.
fn parse_list_value(value: &str) -> Option<(String, String)> {
    let trimmed = value.trim().trim_end_matches('/');

    if let Some(idx) = trimmed.find("/users/") {
        let rest = &trimmed[idx + "/users/".len()..];
        let mut parts = rest.split('/');
        let user = parts.next()?;
        if parts.next()? != "lists" {
            return None;
        }
        let slug = parts.next()?;
        return Some((user.to_string(), slug.to_string()));
    }

    if trimmed.contains("://") {
        return None;
    }
    let (user, slug) = trimmed.split_once('/')?;
    if user.is_empty() || slug.is_empty() || slug.contains('/') {
        return None;
    }
    Some((user.to_string(), slug.to_string()))
}

fn parse_list_items(data: &serde_json::Value) -> Vec<ListedItem> {
    let Some(entries) = data.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let (kind, body) = match entry["type"].as_str() {
                Some("movie") => (MediaKind::Movie, &entry["movie"]),
                Some("show") => (MediaKind::Show, &entry["show"]),
                _ => return None,
            };

            let mut ids = Vec::new();
            if let Some(tmdb) = body["ids"]["tmdb"].as_u64() {
                ids.push(ExternalId::Tmdb(tmdb));
            }
            if let Some(imdb) = body["ids"]["imdb"].as_str() {
                ids.push(ExternalId::Imdb(imdb.replace('/', "")));
            }
            if let Some(tvdb) = body["ids"]["tvdb"].as_u64() {
                ids.push(ExternalId::Tvdb(tvdb));
            }
            if ids.is_empty() {
                return None;
            }

            Some(ListedItem {
                kind,
                title: body["title"].as_str().map(|t| t.to_string()),
                year: body["year"].as_i64().map(|y| y as i32),
                ids,
            })
        })
        .collect()
}
