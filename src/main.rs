use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use yt_elt::config::normalize_handle;
use yt_elt::Config;

/// Pull a channel's uploads and write them to a dated JSON file.
///
/// Settings come from `.env`/the environment (`API_KEY`, `CHANNEL_HANDLE`,
/// ...); flags override them.
#[derive(Parser, Debug)]
#[command(name = "yt-elt", version)]
struct Cli {
    /// Channel handle, without the leading @
    #[arg(long)]
    channel: Option<String>,
    /// Directory for YT_data_<date>.json
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Items per playlist page
    #[arg(long)]
    page_size: Option<usize>,
    /// Ids per video lookup
    #[arg(long)]
    batch_size: Option<usize>,
    /// Concurrent video lookups
    #[arg(long)]
    workers: Option<usize>,
    /// Give up on a playlist after this many pages
    #[arg(long)]
    max_pages: Option<usize>,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(channel) = self.channel {
            config.channel_handle = normalize_handle(&channel);
        }
        if let Some(dir) = self.output_dir {
            config.output_dir = dir;
        }
        if let Some(n) = self.page_size {
            config.page_size = n;
        }
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(n) = self.workers {
            config.num_workers = n;
        }
        if let Some(n) = self.max_pages {
            config.max_pages = n;
        }
    }
}

fn main() -> anyhow::Result<()> {
    yt_elt::init_tracing();
    let cli = Cli::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    info!(channel = %config.channel_handle, "starting extraction");
    match yt_elt::sync(&config) {
        Ok(path) => {
            info!(path = %path.display(), "done");
            Ok(())
        }
        Err(err) => {
            error!(%err, "extraction failed");
            Err(err.into())
        }
    }
}
