use serde::{Deserialize, Serialize};

/// `plex` section. The movie library is required for every method the sync
/// loop supports; the show library only matters for list methods that can
/// return shows.
#[derive(Debug, Clone, Deserialize)]
pub struct PlexConfig {
    pub url: String,
    pub token: String,
    pub movie_library: String,
    #[serde(default)]
    pub show_library: Option<String>,
}

/// `tmdb` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbConfig {
    pub apikey: String,
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "en".to_string()
}

/// `trakt` section.
#[derive(Debug, Clone, Deserialize)]
pub struct TraktConfig {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub authorization: Option<TraktAuthorization>,
}

/// An OAuth token response as Trakt returns it, stored verbatim in the
/// config file so the next run can reuse or refresh it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraktAuthorization {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub refresh_token: String,
    pub scope: String,
    pub created_at: i64,
}

/// `radarr` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RadarrConfig {
    pub url: String,
    pub token: String,
    pub quality_profile_id: i64,
    pub root_folder_path: String,
}

/// `image-server` section. Both keys were independently optional in practice,
/// so the whole section defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageServerConfig {
    #[serde(default = "default_image_host")]
    pub host: String,
    #[serde(default = "default_image_port")]
    pub port: u16,
}

impl Default for ImageServerConfig {
    fn default() -> Self {
        Self {
            host: default_image_host(),
            port: default_image_port(),
        }
    }
}

fn default_image_host() -> String {
    "127.0.0.1".to_string()
}

fn default_image_port() -> u16 {
    5000
}
