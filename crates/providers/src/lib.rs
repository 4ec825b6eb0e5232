pub mod imdb;
pub mod provider;
pub mod radarr;
pub mod tmdb;
pub mod trakt;

use thiserror::Error;

pub use imdb::ImdbList;
pub use provider::ListProvider;
pub use radarr::{AddOutcome, RadarrClient};
pub use tmdb::TmdbClient;
pub use trakt::TraktClient;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider error: {0}")]
    Provider(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("not found")]
    NotFound,
    #[error("authorization error: {0}")]
    Auth(String),
}
