//! The collection update loop.
//!
//! Walks the configured collections in document order. Plex filter methods
//! search the movie library directly; list methods fetch external ids and
//! match them against the library's guid index. A failing value is logged and
//! skipped, so one bad list never aborts the run.

use std::collections::HashMap;
use std::io::Write;

use anyhow::{Context, bail};
use tracing::{debug, info, warn};

use collectarr_config::{CollectionEntry, Config, ImageServerConfig};
use collectarr_core::{ExternalId, ListSource, ListedItem, MediaKind};
use collectarr_plex::{LibraryItem, PlexServer, Section};
use collectarr_providers::{
    AddOutcome, ImdbList, ListProvider, RadarrClient, TmdbClient, TraktClient,
};

use crate::details;

/// Everything the update loop needs, built once in `main`.
pub struct SyncContext {
    pub plex: PlexServer,
    pub movie_section: Section,
    pub show_section: Option<Section>,
    pub tmdb: Option<TmdbClient>,
    pub trakt: Option<TraktClient>,
    pub radarr: Option<RadarrClient>,
    pub imdb: ImdbList,
    pub image_server: ImageServerConfig,
    pub http: reqwest::Client,
    pub skip_radarr: bool,
}

/// How a method name maps onto an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MethodKind {
    /// A Plex tag filter, resolved to a tag key by name first.
    Tag(&'static str),
    /// A Plex query parameter used with the raw value.
    Param(&'static str),
    /// An external list source.
    List(ListSource),
    Unknown,
}

fn classify(name: &str) -> MethodKind {
    match name {
        "actor" | "actors" => MethodKind::Tag("actor"),
        "genre" | "genres" => MethodKind::Tag("genre"),
        "director" | "directors" => MethodKind::Tag("director"),
        "studio" | "studios" => MethodKind::Tag("studio"),
        "year" | "years" => MethodKind::Param("year"),
        "tmdb-list" => MethodKind::List(ListSource::Tmdb),
        "imdb-list" => MethodKind::List(ListSource::Imdb),
        "trakt-list" => MethodKind::List(ListSource::Trakt),
        _ => MethodKind::Unknown,
    }
}

fn method_label(name: &str) -> &str {
    name.strip_suffix('s').unwrap_or(name)
}

/// Library items indexed by every provider id their guids carry.
struct GuidIndex {
    items: Vec<LibraryItem>,
    by_id: HashMap<ExternalId, usize>,
}

impl GuidIndex {
    fn build(items: Vec<LibraryItem>) -> Self {
        let mut by_id = HashMap::new();
        for (idx, item) in items.iter().enumerate() {
            for id in &item.ids {
                by_id.entry(id.clone()).or_insert(idx);
            }
        }
        Self { items, by_id }
    }

    fn find(&self, listed: &ListedItem) -> Option<&LibraryItem> {
        listed
            .ids
            .iter()
            .find_map(|id| self.by_id.get(id))
            .map(|&idx| &self.items[idx])
    }
}

pub async fn run(ctx: &SyncContext, config: &Config, only: Option<&str>) -> anyhow::Result<()> {
    let mut entries = config.collections();
    if let Some(name) = only {
        entries.retain(|e| e.name == name);
        if entries.is_empty() {
            bail!("collection `{name}` not found in config");
        }
    }
    if entries.is_empty() {
        warn!("no collections configured");
        return Ok(());
    }

    // List methods match on guids, so index the libraries up front.
    let needs_index = entries
        .iter()
        .any(|e| e.methods.iter().any(|m| matches!(classify(&m.name), MethodKind::List(_))));

    let movie_index = if needs_index {
        let items = ctx
            .plex
            .section_items(&ctx.movie_section)
            .await
            .context("failed to index movie library")?;
        info!(count = items.len(), library = %ctx.movie_section.title, "movie library indexed");
        Some(GuidIndex::build(items))
    } else {
        None
    };
    let show_index = match (&ctx.show_section, needs_index) {
        (Some(section), true) => {
            let items = ctx
                .plex
                .section_items(section)
                .await
                .context("failed to index show library")?;
            info!(count = items.len(), library = %section.title, "show library indexed");
            Some(GuidIndex::build(items))
        }
        _ => None,
    };

    for entry in &entries {
        if let Err(err) =
            update_collection(ctx, entry, movie_index.as_ref(), show_index.as_ref()).await
        {
            warn!(collection = %entry.name, error = %err, "collection update failed");
        }
    }

    Ok(())
}

async fn update_collection(
    ctx: &SyncContext,
    entry: &CollectionEntry,
    movie_index: Option<&GuidIndex>,
    show_index: Option<&GuidIndex>,
) -> anyhow::Result<()> {
    info!(collection = %entry.name, "updating collection");

    for method in &entry.methods {
        let kind = classify(&method.name);
        for value in &method.values {
            info!("processing {}: {}", method_label(&method.name), value);

            let outcome = match kind {
                MethodKind::Tag(tag) => apply_tag_filter(ctx, entry, tag, value).await,
                MethodKind::Param(param) => apply_param_filter(ctx, entry, param, value).await,
                MethodKind::List(source) => {
                    apply_list(ctx, entry, source, value, movie_index, show_index).await
                }
                MethodKind::Unknown => {
                    warn!(method = %method.name, "unknown method, skipping");
                    continue;
                }
            };

            if let Err(err) = outcome {
                warn!(
                    method = %method.name,
                    value = %value,
                    error = %err,
                    "value failed, continuing"
                );
            }
        }
    }

    details::apply_details(ctx, entry).await
}

async fn apply_tag_filter(
    ctx: &SyncContext,
    entry: &CollectionEntry,
    tag: &str,
    value: &str,
) -> anyhow::Result<()> {
    let Some(key) = ctx
        .plex
        .resolve_tag_key(&ctx.movie_section, tag, value)
        .await?
    else {
        warn!(tag, value, "no matching tag in the movie library");
        return Ok(());
    };

    let items = ctx
        .plex
        .filter_items(&ctx.movie_section, tag, &key, &entry.subfilters)
        .await?;
    add_movie_items(ctx, &items, &entry.name).await
}

async fn apply_param_filter(
    ctx: &SyncContext,
    entry: &CollectionEntry,
    param: &str,
    value: &str,
) -> anyhow::Result<()> {
    let items = ctx
        .plex
        .filter_items(&ctx.movie_section, param, value, &entry.subfilters)
        .await?;
    add_movie_items(ctx, &items, &entry.name).await
}

async fn add_movie_items(
    ctx: &SyncContext,
    items: &[LibraryItem],
    collection: &str,
) -> anyhow::Result<()> {
    for item in items {
        debug!(item = %item.title, collection, "adding to collection");
        ctx.plex
            .add_to_collection(&ctx.movie_section, &item.rating_key, MediaKind::Movie, collection)
            .await?;
    }
    info!(matched = items.len(), collection, "items added");
    Ok(())
}

async fn apply_list(
    ctx: &SyncContext,
    entry: &CollectionEntry,
    source: ListSource,
    value: &str,
    movie_index: Option<&GuidIndex>,
    show_index: Option<&GuidIndex>,
) -> anyhow::Result<()> {
    let provider: &dyn ListProvider = match source {
        ListSource::Tmdb => ctx
            .tmdb
            .as_ref()
            .context("`tmdb` section required for tmdb-list methods")?,
        ListSource::Imdb => &ctx.imdb,
        ListSource::Trakt => ctx
            .trakt
            .as_ref()
            .context("trakt is not available; run `collectarr trakt-auth`")?,
    };

    let listed = provider.fetch_list(value).await?;
    debug!(count = listed.len(), provider = provider.name(), "list fetched");
    let source = provider.source();

    let mut missing_movies = Vec::new();
    let mut missing_shows = Vec::new();

    for item in listed {
        match item.kind {
            MediaKind::Movie => {
                match movie_index.and_then(|index| index.find(&item)) {
                    Some(found) => {
                        ctx.plex
                            .add_to_collection(
                                &ctx.movie_section,
                                &found.rating_key,
                                MediaKind::Movie,
                                &entry.name,
                            )
                            .await?;
                    }
                    None => missing_movies.push(item),
                }
            }
            MediaKind::Show => match (&ctx.show_section, show_index) {
                (Some(section), Some(index)) => match index.find(&item) {
                    Some(found) => {
                        ctx.plex
                            .add_to_collection(
                                section,
                                &found.rating_key,
                                MediaKind::Show,
                                &entry.name,
                            )
                            .await?;
                    }
                    None => missing_shows.push(item),
                },
                _ => missing_shows.push(item),
            },
        }
    }

    if !missing_movies.is_empty() {
        info!(
            count = missing_movies.len(),
            source = %source,
            list = %value,
            "movies missing from the library"
        );
        if !ctx.skip_radarr
            && ctx.radarr.is_some()
            && confirm("Add missing movies to Radarr?")
        {
            push_to_radarr(ctx, &missing_movies).await;
        }
    }
    if !missing_shows.is_empty() {
        // No Sonarr hand-off; the count is still worth reporting.
        info!(
            count = missing_shows.len(),
            source = %source,
            list = %value,
            "shows missing from the library"
        );
    }

    Ok(())
}

async fn push_to_radarr(ctx: &SyncContext, items: &[ListedItem]) {
    let Some(radarr) = &ctx.radarr else {
        warn!("radarr is not configured");
        return;
    };

    for item in items {
        let tmdb_id = match item.tmdb_id() {
            Some(id) => Some(id),
            None => match (&ctx.tmdb, item.imdb_id()) {
                (Some(tmdb), Some(imdb_id)) => match tmdb.find_movie_by_imdb(imdb_id).await {
                    Ok(found) => found.map(|(id, _)| id),
                    Err(err) => {
                        warn!(item = %item.label(), error = %err, "imdb to tmdb lookup failed");
                        None
                    }
                },
                _ => None,
            },
        };

        let Some(tmdb_id) = tmdb_id else {
            warn!(item = %item.label(), "no tmdb id, cannot send to radarr");
            continue;
        };

        match radarr.add_movie(tmdb_id).await {
            Ok(AddOutcome::Added) => info!(movie = %item.label(), "sent to radarr"),
            Ok(AddOutcome::AlreadyPresent) => {
                info!(movie = %item.label(), "already tracked by radarr")
            }
            Err(err) => warn!(movie = %item.label(), error = %err, "radarr add failed"),
        }
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} (y/n): ");
    if std::io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if std::io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    answer.trim().eq_ignore_ascii_case("y")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names_classify() {
        assert_eq!(classify("actors"), MethodKind::Tag("actor"));
        assert_eq!(classify("genre"), MethodKind::Tag("genre"));
        assert_eq!(classify("years"), MethodKind::Param("year"));
        assert_eq!(classify("tmdb-list"), MethodKind::List(ListSource::Tmdb));
        assert_eq!(classify("imdb-list"), MethodKind::List(ListSource::Imdb));
        assert_eq!(classify("trakt-list"), MethodKind::List(ListSource::Trakt));
        assert_eq!(classify("something-else"), MethodKind::Unknown);
    }

    #[test]
    fn method_labels_drop_the_plural_s() {
        assert_eq!(method_label("actors"), "actor");
        assert_eq!(method_label("studio"), "studio");
        assert_eq!(method_label("tmdb-list"), "tmdb-list");
    }

    #[test]
    fn guid_index_matches_on_any_shared_id() {
        let index = GuidIndex::build(vec![LibraryItem {
            rating_key: "101".into(),
            title: "Jurassic Park".into(),
            year: Some(1993),
            ids: vec![ExternalId::Imdb("tt0107290".into()), ExternalId::Tmdb(329)],
        }]);

        let by_tmdb = ListedItem {
            kind: MediaKind::Movie,
            title: None,
            year: None,
            ids: vec![ExternalId::Tmdb(329)],
        };
        assert_eq!(index.find(&by_tmdb).map(|i| i.rating_key.as_str()), Some("101"));

        let unknown = ListedItem {
            kind: MediaKind::Movie,
            title: None,
            year: None,
            ids: vec![ExternalId::Tmdb(603)],
        };
        assert!(index.find(&unknown).is_none());
    }
}
