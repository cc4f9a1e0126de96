use super::enums_structs::{ItemId, PlaylistId, PlaylistItemListResponse};
use crate::error::{Error, Result};
use crate::upstream::{ApiRequest, Upstream};
use std::collections::HashSet;
use tracing::{debug, info, warn};

const ENDPOINT: &str = "playlistItems";

/// Collect every item id in `playlist`, following continuation cursors.
///
/// Ids keep the server's page order. A repeated id is dropped after its
/// first occurrence. Any failing page aborts the whole listing; ids from
/// earlier pages are discarded. Fails with
/// [`Error::PaginationLimitExceeded`] if a cursor is still being handed out
/// after `max_pages` requests.
pub fn list_all_items(
    upstream: &dyn Upstream,
    playlist: &PlaylistId,
    page_size: usize,
    max_pages: usize,
) -> Result<Vec<ItemId>> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        let value = upstream.fetch(&ApiRequest::PlaylistItems {
            playlist: playlist.clone(),
            page_size,
            cursor: cursor.take(),
        })?;
        pages += 1;

        let page: PlaylistItemListResponse =
            serde_json::from_value(value).map_err(|e| Error::shape(ENDPOINT, e.to_string()))?;
        let items = page.items.unwrap_or_default();
        debug!(%playlist, page = pages, items = items.len(), "fetched playlist page");

        for item in items {
            let id = ItemId(item.content_details.video_id);
            if seen.insert(id.clone()) {
                ids.push(id);
            } else {
                warn!(%playlist, %id, "duplicate item in playlist, skipping");
            }
        }

        // an empty token means the same as no token
        cursor = page.next_page_token.filter(|token| !token.is_empty());
        if cursor.is_none() {
            break;
        }
        if pages >= max_pages {
            return Err(Error::PaginationLimitExceeded {
                playlist: playlist.to_string(),
                max_pages,
            });
        }
    }

    info!(%playlist, pages, items = ids.len(), "listed playlist");
    Ok(ids)
}
