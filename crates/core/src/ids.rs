//! Cross-provider item identity.
//!
//! External lists name items by provider ids (TMDB numeric, IMDb `tt…`,
//! TVDB numeric); Plex items carry the same ids inside their GUIDs. Matching
//! happens on any shared id.

use serde::{Deserialize, Serialize};

use crate::types::MediaKind;

/// A single provider-scoped id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalId {
    Tmdb(u64),
    Imdb(String),
    Tvdb(u64),
}

impl std::fmt::Display for ExternalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tmdb(id) => write!(f, "tmdb:{id}"),
            Self::Imdb(id) => write!(f, "imdb:{id}"),
            Self::Tvdb(id) => write!(f, "tvdb:{id}"),
        }
    }
}

/// One entry of an external list, with every id the source reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListedItem {
    pub kind: MediaKind,
    pub title: Option<String>,
    pub year: Option<i32>,
    pub ids: Vec<ExternalId>,
}

impl ListedItem {
    pub fn tmdb_id(&self) -> Option<u64> {
        self.ids.iter().find_map(|id| match id {
            ExternalId::Tmdb(v) => Some(*v),
            _ => None,
        })
    }

    pub fn imdb_id(&self) -> Option<&str> {
        self.ids.iter().find_map(|id| match id {
            ExternalId::Imdb(v) => Some(v.as_str()),
            _ => None,
        })
    }

    /// Display label for log lines: title if known, else the first id.
    pub fn label(&self) -> String {
        match (&self.title, self.ids.first()) {
            (Some(title), _) => title.clone(),
            (None, Some(id)) => id.to_string(),
            (None, None) => "unknown item".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_accessors_pick_matching_variant() {
        let item = ListedItem {
            kind: MediaKind::Movie,
            title: Some("Jurassic Park".into()),
            year: Some(1993),
            ids: vec![
                ExternalId::Imdb("tt0107290".into()),
                ExternalId::Tmdb(329),
            ],
        };
        assert_eq!(item.tmdb_id(), Some(329));
        assert_eq!(item.imdb_id(), Some("tt0107290"));
        assert_eq!(item.label(), "Jurassic Park");
    }

    #[test]
    fn label_falls_back_to_first_id() {
        let item = ListedItem {
            kind: MediaKind::Movie,
            title: None,
            year: None,
            ids: vec![ExternalId::Tmdb(603)],
        };
        assert_eq!(item.label(), "tmdb:603");
    }
}
