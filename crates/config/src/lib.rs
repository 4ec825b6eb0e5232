//! YAML configuration document.
//!
//! The file is externally owned: sections this tool understands are read into
//! typed views, everything else is carried through untouched. Only two writes
//! exist (a refreshed Trakt authorization, user-requested collection
//! additions), so the document is kept as a raw [`serde_yaml::Value`] and
//! mutated surgically before being rewritten.

pub mod entry;
pub mod model;
pub mod mutate;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

pub use entry::{CollectionEntry, MethodCall};
pub use model::{
    ImageServerConfig, PlexConfig, RadarrConfig, TmdbConfig, TraktAuthorization, TraktConfig,
};
pub use mutate::MergeOutcome;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("`{0}` is not a mapping")]
    NotAMapping(&'static str),
    #[error("missing `{0}` section")]
    MissingSection(&'static str),
    #[error("invalid `{section}` section: {source}")]
    Section {
        section: &'static str,
        source: serde_yaml::Error,
    },
    #[error("unsupported method `{0}`")]
    UnsupportedMethod(String),
}

/// Loaded configuration: the raw document plus typed views of the sections
/// the sync loop needs.
#[derive(Debug)]
pub struct Config {
    path: PathBuf,
    doc: serde_yaml::Value,
    pub plex: PlexConfig,
    pub tmdb: Option<TmdbConfig>,
    pub trakt: Option<TraktConfig>,
    pub radarr: Option<RadarrConfig>,
    pub image_server: ImageServerConfig,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let doc: serde_yaml::Value = serde_yaml::from_str(&raw)?;
        Self::from_document(path, doc)
    }

    fn from_document(path: PathBuf, doc: serde_yaml::Value) -> Result<Self, ConfigError> {
        if doc.as_mapping().is_none() {
            return Err(ConfigError::NotAMapping("config"));
        }

        let plex = required_section(&doc, "plex")?;
        let tmdb = optional_section(&doc, "tmdb")?;
        let trakt = optional_section(&doc, "trakt")?;
        let radarr = optional_section(&doc, "radarr")?;
        let image_server: Option<ImageServerConfig> = optional_section(&doc, "image-server")?;

        debug!(path = %path.display(), "config loaded");

        Ok(Self {
            path,
            doc,
            plex,
            tmdb,
            trakt,
            radarr,
            image_server: image_server.unwrap_or_default(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Configured collections in document order. Entries that are not
    /// mappings (or have non-string names) are skipped.
    pub fn collections(&self) -> Vec<CollectionEntry> {
        let Some(collections) = self.doc.get("collections").and_then(|v| v.as_mapping()) else {
            return Vec::new();
        };

        collections
            .iter()
            .filter_map(|(name, body)| {
                let name = name.as_str()?;
                let body = body.as_mapping()?;
                Some(entry::parse_entry(name, body))
            })
            .collect()
    }

    /// Rewrite the config file from the in-memory document.
    pub fn save(&self) -> Result<(), ConfigError> {
        let raw = serde_yaml::to_string(&self.doc)?;
        std::fs::write(&self.path, raw).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        debug!(path = %self.path.display(), "config written");
        Ok(())
    }
}

fn required_section<T: serde::de::DeserializeOwned>(
    doc: &serde_yaml::Value,
    name: &'static str,
) -> Result<T, ConfigError> {
    let value = doc
        .get(name)
        .ok_or(ConfigError::MissingSection(name))?
        .clone();
    serde_yaml::from_value(value).map_err(|source| ConfigError::Section {
        section: name,
        source,
    })
}

fn optional_section<T: serde::de::DeserializeOwned>(
    doc: &serde_yaml::Value,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match doc.get(name) {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(value) => serde_yaml::from_value(value.clone())
            .map(Some)
            .map_err(|source| ConfigError::Section {
                section: name,
                source,
            }),
    }
}
