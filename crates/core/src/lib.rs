pub mod ids;
pub mod types;

pub use ids::{ExternalId, ListedItem};
pub use types::{ListSource, MediaKind};
