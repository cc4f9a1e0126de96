use super::enums_structs::{ChannelHandle, ChannelListResponse, ChannelResource, PlaylistId};
use crate::error::{Error, Result};
use crate::upstream::{ApiRequest, Upstream};
use tracing::{info, warn};

const ENDPOINT: &str = "channels";

/// Look up the uploads playlist of the channel behind `handle`.
///
/// If the upstream returns several channels the first one wins.
pub fn resolve_uploads_playlist(
    upstream: &dyn Upstream,
    handle: &ChannelHandle,
) -> Result<PlaylistId> {
    let value = upstream.fetch(&ApiRequest::Channel {
        handle: handle.clone(),
    })?;

    let response: ChannelListResponse =
        serde_json::from_value(value).map_err(|e| Error::shape(ENDPOINT, e.to_string()))?;
    let mut items = response.items.unwrap_or_default();
    if items.is_empty() {
        return Err(Error::shape(
            ENDPOINT,
            format!("no channel matched handle {handle}"),
        ));
    }
    if items.len() > 1 {
        warn!(%handle, matches = items.len(), "several channels matched, using the first");
    }

    let channel: ChannelResource = serde_json::from_value(items.swap_remove(0))
        .map_err(|e| Error::shape(ENDPOINT, e.to_string()))?;
    let playlist = PlaylistId(channel.content_details.related_playlists.uploads);

    info!(%handle, %playlist, "resolved uploads playlist");
    Ok(playlist)
}
