pub mod client;
pub mod guid;

use thiserror::Error;

pub use client::{LibraryItem, PlexCollection, PlexServer, Section};

#[derive(Error, Debug)]
pub enum PlexError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {0}")]
    Server(String),
    #[error("parse response: {0}")]
    Parse(String),
    #[error("library `{0}` not found")]
    LibraryNotFound(String),
}
