use collectarr_core::{ListSource, ListedItem};

use crate::ProviderError;

/// An external list source that can resolve a config value into items.
#[async_trait::async_trait]
pub trait ListProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Which service this provider talks to, for reporting.
    fn source(&self) -> ListSource;

    /// Fetch the list a config method value names. The value's shape is
    /// provider-specific: a URL, a bare id, or a `user/slug` pair.
    async fn fetch_list(&self, value: &str) -> Result<Vec<ListedItem>, ProviderError>;
}
