use super::enums_structs::EnrichedRecord;
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::error;

/// Results shared between enrichment workers.
///
/// Chunks finish in any order; they are keyed by chunk number so the merge
/// can put them back in input order.
#[derive(Default)]
pub(crate) struct EnrichState {
    chunk_records: Mutex<BTreeMap<usize, Vec<EnrichedRecord>>>,
    /// lowest-numbered failing chunk seen so far
    failure: Mutex<Option<(usize, Error)>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EnrichState {
    /// A chunk after a known failure cannot change the outcome.
    pub(crate) fn should_skip(&self, chunk: usize) -> bool {
        matches!(&*lock(&self.failure), Some((failed, _)) if *failed < chunk)
    }

    pub(crate) fn record_chunk(&self, chunk: usize, records: Vec<EnrichedRecord>) {
        lock(&self.chunk_records).insert(chunk, records);
    }

    pub(crate) fn record_failure(&self, chunk: usize, err: Error) {
        let mut failure = lock(&self.failure);
        let replace = match &*failure {
            Some((failed, _)) => chunk < *failed,
            None => true,
        };
        if replace {
            *failure = Some((chunk, err));
        }
    }

    /// Merge all chunk results in chunk order, or return the first failure.
    pub(crate) fn finish(&self, total_chunks: usize) -> Result<Vec<EnrichedRecord>> {
        if let Some((_, err)) = lock(&self.failure).take() {
            return Err(err);
        }

        let mut chunk_records = std::mem::take(&mut *lock(&self.chunk_records));
        let mut records = Vec::new();
        for chunk in 0..total_chunks {
            match chunk_records.remove(&chunk) {
                Some(chunk) => records.extend(chunk),
                None => {
                    error!(chunk, "enrichment worker exited without a result");
                    return Err(Error::WorkerLost { chunk });
                }
            }
        }
        Ok(records)
    }
}
