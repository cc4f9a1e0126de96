use super::enums_structs::{EnrichedRecord, ItemId, VideoListResponse, VideoResource};
use super::state::EnrichState;
use crate::error::{Error, Result};
use crate::upstream::{ApiRequest, Upstream};
use std::sync::Arc;
use threadpool::ThreadPool;
use tracing::{debug, info};

const ENDPOINT: &str = "videos";

/// Look up details for `ids` in chunks of at most `batch_size`.
///
/// Records come back in chunk order, then in the order the upstream listed
/// them within each chunk. Ids the upstream does not return are simply
/// absent from the output. With `num_workers > 1` chunks are fetched on a
/// thread pool; the output order is the same either way. Any failing chunk
/// fails the whole call.
pub fn enrich(
    upstream: Arc<dyn Upstream>,
    ids: &[ItemId],
    batch_size: usize,
    num_workers: usize,
) -> Result<Vec<EnrichedRecord>> {
    if batch_size == 0 {
        return Err(Error::config("BATCH_SIZE", "must be at least 1"));
    }

    let chunks: Vec<Vec<ItemId>> = ids.chunks(batch_size).map(<[ItemId]>::to_vec).collect();
    let total_chunks = chunks.len();

    let records = if num_workers <= 1 || total_chunks <= 1 {
        let mut records = Vec::with_capacity(ids.len());
        for (n, chunk) in chunks.iter().enumerate() {
            records.extend(fetch_chunk(upstream.as_ref(), n, chunk)?);
        }
        records
    } else {
        let state = Arc::new(EnrichState::default());
        let pool = ThreadPool::new(num_workers.min(total_chunks));

        for (n, chunk) in chunks.into_iter().enumerate() {
            let s = state.clone();
            let upstream = upstream.clone();
            pool.execute(move || {
                if s.should_skip(n) {
                    return;
                }
                match fetch_chunk(upstream.as_ref(), n, &chunk) {
                    Ok(records) => s.record_chunk(n, records),
                    Err(err) => s.record_failure(n, err),
                }
            });
        }

        // wait for all workers to finish
        pool.join();
        state.finish(total_chunks)?
    };

    info!(
        requested = ids.len(),
        returned = records.len(),
        chunks = total_chunks,
        "enriched items"
    );
    Ok(records)
}

fn fetch_chunk(upstream: &dyn Upstream, n: usize, chunk: &[ItemId]) -> Result<Vec<EnrichedRecord>> {
    let value = upstream.fetch(&ApiRequest::Videos {
        ids: chunk.to_vec(),
    })?;
    let response: VideoListResponse =
        serde_json::from_value(value).map_err(|e| Error::shape(ENDPOINT, e.to_string()))?;

    let records: Vec<EnrichedRecord> = response
        .items
        .unwrap_or_default()
        .into_iter()
        .map(VideoResource::into_record)
        .collect();
    debug!(chunk = n, ids = chunk.len(), records = records.len(), "fetched chunk");
    Ok(records)
}
