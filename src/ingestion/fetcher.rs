//! Cursor-driven pagination over a catalog listing.

use crate::error::FetchError;
use crate::ingestion::types::{CatalogEntity, CatalogPage, FetchMetadata};
use async_trait::async_trait;

/// Upper bound on listing pages per fetch. Hitting it truncates, it is not an error.
pub const MAX_PAGES: usize = 100;

/// Something that can serve one page of the catalog listing.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the page at `cursor`, or the first page when `cursor` is `None`.
    async fn fetch_page(&self, cursor: Option<&str>) -> Result<CatalogPage, FetchError>;
}

/// Page through `source` until the cursor runs out or `MAX_PAGES` is reached.
///
/// Pages are requested strictly one after another since each cursor is only
/// known once the previous page resolved. Any page failure fails the whole
/// fetch and the entities accumulated so far are dropped.
pub async fn fetch_all(
    source: &dyn PageSource,
) -> Result<(Vec<CatalogEntity>, FetchMetadata), FetchError> {
    let mut servers: Vec<CatalogEntity> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;
    let mut truncated = false;

    loop {
        pages += 1;
        let page = source.fetch_page(cursor.as_deref()).await?;

        tracing::debug!(
            page = pages,
            servers = page.servers.len(),
            total = servers.len() + page.servers.len(),
            "Fetched listing page"
        );

        servers.extend(page.servers);
        cursor = page
            .next_cursor
            .filter(|next| !next.trim().is_empty());

        if cursor.is_none() {
            break;
        }

        if pages >= MAX_PAGES {
            tracing::warn!(
                max_pages = MAX_PAGES,
                total = servers.len(),
                "Reached page limit, stopping pagination"
            );
            truncated = true;
            break;
        }
    }

    tracing::info!(total = servers.len(), pages, truncated, "Catalog fetch complete");

    let metadata = FetchMetadata {
        count: servers.len(),
        next_cursor: cursor,
        pages,
        truncated,
    };

    Ok((servers, metadata))
}
