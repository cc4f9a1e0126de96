//! The video platform's read-only REST API, as seen by the pipeline.
//!
//! Stages only talk to [`Upstream`], so tests can replace the HTTP client
//! with a scripted source.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::pipeline::{ChannelHandle, ItemId, PlaylistId};
use serde_json::Value;
use tracing::debug;

const USER_AGENT: &str = concat!("yt-elt/", env!("CARGO_PKG_VERSION"));

/// One lookup against the upstream API
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiRequest {
    /// Channel lookup by handle, content-details facet only
    Channel {
        /// Handle to look up
        handle: ChannelHandle,
    },
    /// One page of a playlist
    PlaylistItems {
        /// Playlist being listed
        playlist: PlaylistId,
        /// Items requested per page
        page_size: usize,
        /// Cursor from the previous page, if any
        cursor: Option<String>,
    },
    /// Snippet, content details and statistics for a batch of videos
    Videos {
        /// Ids in this batch
        ids: Vec<ItemId>,
    },
}

impl ApiRequest {
    /// Endpoint name, used in errors and logs.
    pub fn endpoint(&self) -> &'static str {
        match self {
            ApiRequest::Channel { .. } => "channels",
            ApiRequest::PlaylistItems { .. } => "playlistItems",
            ApiRequest::Videos { .. } => "videos",
        }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            ApiRequest::Channel { handle } => vec![
                ("part", "contentDetails".to_string()),
                ("forHandle", handle.as_str().to_string()),
            ],
            ApiRequest::PlaylistItems {
                playlist,
                page_size,
                cursor,
            } => {
                let mut query = vec![
                    ("part", "contentDetails".to_string()),
                    ("maxResults", page_size.to_string()),
                    ("playlistId", playlist.as_str().to_string()),
                ];
                if let Some(cursor) = cursor {
                    query.push(("pageToken", cursor.clone()));
                }
                query
            }
            ApiRequest::Videos { ids } => vec![
                ("part", "contentDetails,snippet,statistics".to_string()),
                ("id", ItemId::join(ids)),
            ],
        }
    }
}

/// A source of JSON responses for [`ApiRequest`]s
pub trait Upstream: Send + Sync {
    /// Perform a single request; no retries.
    fn fetch(&self, request: &ApiRequest) -> Result<Value>;
}

/// [`Upstream`] backed by the real HTTP API
pub struct HttpUpstream {
    client: reqwest::blocking::Client,
    base_url: String,
    api_key: String,
}

impl HttpUpstream {
    /// Create a blocking client from the run configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::request("client", e))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Full URL for `request`, without the credential.
    pub fn url(&self, request: &ApiRequest) -> String {
        format!("{}/{}", self.base_url, request.endpoint())
    }
}

impl Upstream for HttpUpstream {
    fn fetch(&self, request: &ApiRequest) -> Result<Value> {
        let endpoint = request.endpoint();
        let url = self.url(request);
        let query = request.query();
        debug!(%url, ?query, "upstream request");

        let response = self
            .client
            .get(&url)
            .query(&query)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .map_err(|e| Error::request(endpoint, e))?;

        let response = response
            .error_for_status()
            .map_err(|e| Error::request(endpoint, e))?;

        response
            .json::<Value>()
            .map_err(|e| Error::request(endpoint, e))
    }
}
