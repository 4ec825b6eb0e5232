//! Collection `details` processing: summary text and poster image.
//!
//! Summary and poster values resolve through TMDB when the detail key asks
//! for it. When no poster is configured at all, the ad hoc image server is
//! probed for a file named after the collection.

use anyhow::Context;
use tracing::{debug, info, warn};

use collectarr_config::CollectionEntry;
use collectarr_core::MediaKind;

use crate::sync::SyncContext;

pub async fn apply_details(ctx: &SyncContext, entry: &CollectionEntry) -> anyhow::Result<()> {
    if entry.details.is_empty() {
        return Ok(());
    }

    let mut collections = ctx
        .plex
        .collections_named(&ctx.movie_section, &entry.name)
        .await
        .context("failed to look up collection")?;
    if let Some(shows) = &ctx.show_section {
        collections.extend(
            ctx.plex
                .collections_named(shows, &entry.name)
                .await
                .context("failed to look up show collection")?,
        );
    }

    if collections.len() > 1 {
        warn!(
            collection = %entry.name,
            "multiple collections share this name, `details` update is unsupported"
        );
        return Ok(());
    }
    let Some(collection) = collections.into_iter().next() else {
        warn!(collection = %entry.name, "collection does not exist yet, skipping details");
        return Ok(());
    };

    let section = match collection.subtype {
        MediaKind::Movie => &ctx.movie_section,
        MediaKind::Show => ctx
            .show_section
            .as_ref()
            .context("show collection found but no show library configured")?,
    };

    let mut poster: Option<String> = None;
    for (key, value) in &entry.details {
        if key.contains("summary") {
            let text = if key.contains("tmdb") {
                match tmdb_summary(ctx, value).await {
                    Some(text) => text,
                    None => continue,
                }
            } else {
                value.clone()
            };
            ctx.plex
                .set_collection_summary(section, &collection.rating_key, &text)
                .await
                .context("failed to update summary")?;
            info!(collection = %entry.name, "summary updated");
        }

        if key.contains("poster") {
            poster = if key.contains("tmdb") {
                tmdb_poster(ctx, value).await
            } else {
                Some(value.clone())
            };
        }
    }

    if poster.is_none() {
        poster = image_server_poster(ctx, &entry.name).await;
    }
    if let Some(url) = poster {
        ctx.plex
            .upload_poster(&collection.rating_key, &url)
            .await
            .context("failed to upload poster")?;
        info!(collection = %entry.name, poster = %url, "poster updated");
    }

    Ok(())
}

async fn tmdb_summary(ctx: &SyncContext, id: &str) -> Option<String> {
    let Some(tmdb) = &ctx.tmdb else {
        warn!("`tmdb` section required for tmdb-summary details");
        return None;
    };
    match tmdb.summary(id).await {
        Ok(text) => Some(text),
        Err(err) => {
            warn!(id, error = %err, "tmdb summary lookup failed");
            None
        }
    }
}

async fn tmdb_poster(ctx: &SyncContext, id: &str) -> Option<String> {
    let Some(tmdb) = &ctx.tmdb else {
        warn!("`tmdb` section required for tmdb-poster details");
        return None;
    };
    match tmdb.poster_url(id).await {
        Ok(url) => Some(url),
        Err(err) => {
            warn!(id, error = %err, "tmdb poster lookup failed");
            None
        }
    }
}

/// Probe the image server for `/images/<collection name>`. Anything but a
/// 404 counts as a hit; an unreachable server just means no poster.
async fn image_server_poster(ctx: &SyncContext, name: &str) -> Option<String> {
    let url = format!(
        "http://{}:{}/images/{}",
        ctx.image_server.host,
        ctx.image_server.port,
        urlencoding::encode(name)
    );

    match ctx.http.get(&url).send().await {
        Ok(resp) if resp.status() != reqwest::StatusCode::NOT_FOUND => Some(url),
        Ok(_) => None,
        Err(err) => {
            debug!(url = %url, error = %err, "image server not reachable");
            None
        }
    }
}
