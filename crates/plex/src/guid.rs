//! Plex GUID parsing.
//!
//! Items carry external ids two ways: the modern `Guid` tag array
//! (`imdb://tt0107290`, `tmdb://329`) and the legacy agent guid
//! (`com.plexapp.agents.imdb://tt0107290?lang=en`). Both map onto the same
//! provider ids.

use collectarr_core::ExternalId;

/// Parse one guid string into a provider id, if the scheme is recognized.
pub fn parse_guid(raw: &str) -> Option<ExternalId> {
    let (scheme, rest) = raw.split_once("://")?;
    let id = rest.split('?').next().unwrap_or(rest);

    if scheme == "imdb" || scheme.ends_with(".imdb") {
        if id.starts_with("tt") {
            return Some(ExternalId::Imdb(id.to_string()));
        }
        return None;
    }
    if scheme == "tmdb" || scheme.ends_with(".themoviedb") {
        return id.parse().ok().map(ExternalId::Tmdb);
    }
    if scheme == "tvdb" || scheme.ends_with(".thetvdb") {
        return id.parse().ok().map(ExternalId::Tvdb);
    }
    None
}

/// Collect provider ids from an item's `Guid` array and legacy `guid` field.
pub fn collect_ids(item: &serde_json::Value) -> Vec<ExternalId> {
    let mut ids = Vec::new();

    if let Some(guids) = item["Guid"].as_array() {
        for guid in guids {
            if let Some(parsed) = guid["id"].as_str().and_then(parse_guid) {
                if !ids.contains(&parsed) {
                    ids.push(parsed);
                }
            }
        }
    }

    if let Some(parsed) = item["guid"].as_str().and_then(parse_guid) {
        if !ids.contains(&parsed) {
            ids.push(parsed);
        }
    }

    ids
}
