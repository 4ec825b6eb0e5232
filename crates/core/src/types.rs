use serde::{Deserialize, Serialize};

/// Kind of library item a collection entry can match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Movie,
    Show,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Show => "show",
        }
    }

    /// Plex numeric item type for section edit calls.
    pub fn plex_type(self) -> u32 {
        match self {
            Self::Movie => 1,
            Self::Show => 2,
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External service a list of items was fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSource {
    Tmdb,
    Imdb,
    Trakt,
}

impl ListSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tmdb => "TMDb",
            Self::Imdb => "IMDb",
            Self::Trakt => "Trakt",
        }
    }
}

impl std::fmt::Display for ListSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
