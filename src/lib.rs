//! Extract a channel's video catalogue into a flat JSON snapshot.
//!
//! The uploads playlist of a channel is resolved, paginated into video ids,
//! and the ids are looked up in batches to produce one [`EnrichedRecord`]
//! per video. The standalone `yt-elt` binary and the `yt_elt` Python module
//! (feature `python`) both drive the same [`Pipeline`].

pub mod config;
pub mod error;
pub mod pipeline;
pub mod storage;
pub mod upstream;

#[cfg(feature = "python")]
mod python;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use pipeline::{ChannelHandle, EnrichedRecord, ItemId, Pipeline, PlaylistId};
pub use upstream::{ApiRequest, HttpUpstream, Upstream};

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Run the full extraction for `config.channel_handle` and write today's snapshot.
pub fn sync(config: &Config) -> Result<PathBuf> {
    config.validate()?;
    let pipeline = Pipeline::from_config(config)?;
    let records = pipeline.run(&ChannelHandle::from(config.channel_handle.as_str()))?;
    storage::save_to_json_today(&records, &config.output_dir)
}

/// Log to stderr, `info` unless `RUST_LOG` says otherwise. Safe to call twice.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
