//! `yt_elt` Python extension module: one callable per DAG task.
//!
//! The orchestrator passes each task's return value to the next one, so
//! everything crossing the boundary is plain Python data (str, list, dict).

use crate::config::{normalize_handle, Config, DEFAULT_MAX_PAGES, MAX_RESULTS};
use crate::error::{Error, ErrorKind};
use crate::pipeline::{ChannelHandle, EnrichedRecord, ItemId, Pipeline, PlaylistId};
use crate::storage;
use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyKeyError, PyOSError, PyRuntimeError};
use pyo3::prelude::*;
use pyo3::types::PyDict;
use std::path::Path;

create_exception!(yt_elt, UpstreamRequestError, PyException);
create_exception!(yt_elt, UpstreamShapeError, PyException);
create_exception!(yt_elt, PaginationLimitExceeded, PyException);
create_exception!(yt_elt, ConfigError, PyException);

impl From<Error> for PyErr {
    fn from(err: Error) -> PyErr {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Request => UpstreamRequestError::new_err(message),
            ErrorKind::Shape => UpstreamShapeError::new_err(message),
            ErrorKind::PaginationLimit => PaginationLimitExceeded::new_err(message),
            ErrorKind::Config => ConfigError::new_err(message),
            ErrorKind::Io => PyOSError::new_err(message),
            ErrorKind::Internal => PyRuntimeError::new_err(message),
        }
    }
}

fn pipeline(config: &Config) -> PyResult<Pipeline> {
    config.validate()?;
    Ok(Pipeline::from_config(config)?)
}

fn config(api_key: String, base_url: Option<String>) -> Config {
    let mut config = Config::new(api_key);
    if let Some(url) = base_url {
        config.base_url = url;
    }
    config
}

/// Resolve the uploads playlist id for `channel_handle`.
#[pyfunction]
#[pyo3(signature = (api_key, channel_handle, base_url = None))]
fn get_playlist_id(
    py: Python<'_>,
    api_key: String,
    channel_handle: String,
    base_url: Option<String>,
) -> PyResult<String> {
    let mut config = config(api_key, base_url);
    config.channel_handle = normalize_handle(&channel_handle);
    let pipeline = pipeline(&config)?;
    let handle = ChannelHandle(config.channel_handle);

    let playlist = py.allow_threads(|| pipeline.resolve_uploads_playlist(&handle))?;
    Ok(playlist.0)
}

/// List every video id in `playlist_id`.
#[pyfunction]
#[pyo3(signature = (api_key, playlist_id, page_size = MAX_RESULTS, max_pages = DEFAULT_MAX_PAGES, base_url = None))]
fn get_video_ids(
    py: Python<'_>,
    api_key: String,
    playlist_id: String,
    page_size: usize,
    max_pages: usize,
    base_url: Option<String>,
) -> PyResult<Vec<String>> {
    let mut config = config(api_key, base_url);
    config.page_size = page_size;
    config.max_pages = max_pages;
    let pipeline = pipeline(&config)?;
    let playlist = PlaylistId(playlist_id);

    let ids = py.allow_threads(|| pipeline.list_all_items(&playlist))?;
    Ok(ids.into_iter().map(|id| id.0).collect())
}

/// Fetch title, publish date, duration and statistics for `video_ids`.
#[pyfunction]
#[pyo3(signature = (api_key, video_ids, batch_size = MAX_RESULTS, num_workers = 1, base_url = None))]
fn extract_video_data(
    py: Python<'_>,
    api_key: String,
    video_ids: Vec<String>,
    batch_size: usize,
    num_workers: usize,
    base_url: Option<String>,
) -> PyResult<Vec<PyObject>> {
    let mut config = config(api_key, base_url);
    config.batch_size = batch_size;
    config.num_workers = num_workers;
    let pipeline = pipeline(&config)?;
    let ids: Vec<ItemId> = video_ids.into_iter().map(ItemId).collect();

    let records = py.allow_threads(|| pipeline.enrich(&ids))?;
    records
        .iter()
        .map(|record| record_to_dict(py, record))
        .collect()
}

/// Write the extracted records to `output_dir/YT_data_{today}.json`.
#[pyfunction]
#[pyo3(signature = (extracted_data, output_dir = "./data"))]
fn save_to_json(extracted_data: Vec<&PyDict>, output_dir: &str) -> PyResult<String> {
    let records = extracted_data
        .into_iter()
        .map(record_from_dict)
        .collect::<PyResult<Vec<_>>>()?;
    let path = storage::save_to_json_today(&records, Path::new(output_dir))?;
    Ok(path.display().to_string())
}

/// Run the whole chain from `.env`/environment settings; returns the file written.
#[pyfunction]
fn sync(py: Python<'_>) -> PyResult<String> {
    crate::init_tracing();
    let config = Config::from_env()?;
    let path = py.allow_threads(|| crate::sync(&config))?;
    Ok(path.display().to_string())
}

fn record_to_dict(py: Python<'_>, record: &EnrichedRecord) -> PyResult<PyObject> {
    let dict = PyDict::new(py);
    for (key, value) in record.to_fields() {
        dict.set_item(key, value)?;
    }
    Ok(dict.to_object(py))
}

fn record_from_dict(dict: &PyDict) -> PyResult<EnrichedRecord> {
    EnrichedRecord::from_fields(
        |key| -> PyResult<Option<String>> {
            match dict.get_item(key) {
                Some(value) if !value.is_none() => Ok(Some(value.extract()?)),
                _ => Ok(None),
            }
        },
        |key| PyKeyError::new_err(key),
    )
}

#[pymodule]
fn yt_elt(py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(get_playlist_id, m)?)?;
    m.add_function(wrap_pyfunction!(get_video_ids, m)?)?;
    m.add_function(wrap_pyfunction!(extract_video_data, m)?)?;
    m.add_function(wrap_pyfunction!(save_to_json, m)?)?;
    m.add_function(wrap_pyfunction!(sync, m)?)?;
    m.add("UpstreamRequestError", py.get_type::<UpstreamRequestError>())?;
    m.add("UpstreamShapeError", py.get_type::<UpstreamShapeError>())?;
    m.add(
        "PaginationLimitExceeded",
        py.get_type::<PaginationLimitExceeded>(),
    )?;
    m.add("ConfigError", py.get_type::<ConfigError>())?;
    Ok(())
}
