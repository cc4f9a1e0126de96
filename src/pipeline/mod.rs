//! Channel handle → uploads playlist → item ids → enriched records.
//!
//! Each stage is a plain function of its input and an [`Upstream`]; none of
//! them keeps state between calls, so a run can be restarted from any stage
//! boundary given the previous stage's output.

mod enrich;
mod enums_structs;
mod paginate;
mod resolve;
mod state;

pub use enrich::enrich;
pub use enums_structs::{ChannelHandle, EnrichedRecord, ItemId, PlaylistId};
pub use paginate::list_all_items;
pub use resolve::resolve_uploads_playlist;

use crate::config::Config;
use crate::error::Result;
use crate::upstream::{HttpUpstream, Upstream};
use std::sync::Arc;
use tracing::info;

/// The three stages bound to one upstream and one set of size limits
#[derive(Clone)]
pub struct Pipeline {
    upstream: Arc<dyn Upstream>,
    page_size: usize,
    batch_size: usize,
    max_pages: usize,
    num_workers: usize,
}

impl Pipeline {
    /// Use `upstream` with the sizes from `config`.
    pub fn new(upstream: Arc<dyn Upstream>, config: &Config) -> Self {
        Self {
            upstream,
            page_size: config.page_size,
            batch_size: config.batch_size,
            max_pages: config.max_pages,
            num_workers: config.num_workers,
        }
    }

    /// Talk to the real API described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let upstream = HttpUpstream::new(config)?;
        Ok(Self::new(Arc::new(upstream), config))
    }

    pub fn resolve_uploads_playlist(&self, handle: &ChannelHandle) -> Result<PlaylistId> {
        resolve_uploads_playlist(self.upstream.as_ref(), handle)
    }

    pub fn list_all_items(&self, playlist: &PlaylistId) -> Result<Vec<ItemId>> {
        list_all_items(
            self.upstream.as_ref(),
            playlist,
            self.page_size,
            self.max_pages,
        )
    }

    pub fn enrich(&self, ids: &[ItemId]) -> Result<Vec<EnrichedRecord>> {
        enrich(
            self.upstream.clone(),
            ids,
            self.batch_size,
            self.num_workers,
        )
    }

    /// Run all three stages for `handle`. The first failure ends the run.
    pub fn run(&self, handle: &ChannelHandle) -> Result<Vec<EnrichedRecord>> {
        let playlist = self.resolve_uploads_playlist(handle)?;
        let ids = self.list_all_items(&playlist)?;
        let records = self.enrich(&ids)?;
        info!(%handle, %playlist, records = records.len(), "extraction finished");
        Ok(records)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{playlist_page, video_page, ScriptedUpstream};
    use super::*;
    use crate::upstream::ApiRequest;
    use serde_json::json;

    fn config() -> Config {
        Config::new("test-key")
    }

    #[test]
    fn test_end_to_end_two_pages_two_batches() {
        let page_one: Vec<String> = (0..50).map(|i| format!("id{i:02}")).collect();
        let page_two: Vec<String> = (50..62).map(|i| format!("id{i:02}")).collect();
        let pages = vec![
            playlist_page(&page_one, Some("CDIQAA")),
            playlist_page(&page_two, None),
        ];
        let pages = std::sync::Mutex::new(pages.into_iter());

        let upstream = Arc::new(ScriptedUpstream::responder(move |request| match request {
            ApiRequest::Channel { handle } => {
                assert_eq!(handle.as_str(), "MrBeast");
                Ok(json!({"items": [{"contentDetails": {"relatedPlaylists": {"uploads": "UUabc"}}}]}))
            }
            ApiRequest::PlaylistItems { playlist, .. } => {
                assert_eq!(playlist.as_str(), "UUabc");
                Ok(pages.lock().unwrap().next().expect("only two pages"))
            }
            ApiRequest::Videos { ids } => Ok(video_page(ids)),
        }));

        let pipeline = Pipeline::new(upstream.clone(), &config());
        let records = pipeline.run(&ChannelHandle::from("MrBeast")).unwrap();

        assert_eq!(records.len(), 62);
        let expected: Vec<String> = page_one.iter().chain(&page_two).cloned().collect();
        let returned: Vec<String> = records.into_iter().map(|r| r.id.0).collect();
        assert_eq!(returned, expected);

        let batch_sizes: Vec<usize> = upstream
            .requests()
            .into_iter()
            .filter_map(|r| match r {
                ApiRequest::Videos { ids } => Some(ids.len()),
                _ => None,
            })
            .collect();
        assert_eq!(batch_sizes, vec![50, 12]);
    }

    #[test]
    fn test_failed_resolve_stops_the_run() {
        let upstream = Arc::new(ScriptedUpstream::new(vec![Ok(json!({"items": []}))]));
        let pipeline = Pipeline::new(upstream.clone(), &config());

        let err = pipeline.run(&ChannelHandle::from("ghost")).unwrap_err();
        assert!(err.is_shape_error());
        assert_eq!(upstream.requests().len(), 1);
    }
}
