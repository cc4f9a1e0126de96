//! Drives the pipeline against a mock of the platform's REST API.

use serde_json::{json, Value};
use std::path::PathBuf;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};
use yt_elt::{ChannelHandle, Config, Error, Pipeline, PlaylistId};

const KEY: &str = "test-key";

fn config(server: &MockServer) -> Config {
    let mut config = Config::new(KEY);
    config.base_url = server.uri();
    config
}

fn ids(range: std::ops::Range<usize>) -> Vec<String> {
    range.map(|i| format!("vid{i:03}")).collect()
}

fn playlist_page(ids: &[String], next: Option<&str>) -> Value {
    let items: Vec<Value> = ids
        .iter()
        .map(|id| json!({"kind": "youtube#playlistItem", "contentDetails": {"videoId": id}}))
        .collect();
    let mut page = json!({"kind": "youtube#playlistItemListResponse", "items": items});
    if let Some(token) = next {
        page["nextPageToken"] = json!(token);
    }
    page
}

/// Answers `videos?id=a,b,c` with one resource per requested id.
/// Every third video has comments disabled.
struct EchoVideos;

impl Respond for EchoVideos {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let ids = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "id")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();
        let items: Vec<Value> = ids
            .split(',')
            .filter(|id| !id.is_empty())
            .enumerate()
            .map(|(i, id)| {
                let mut statistics = json!({"viewCount": "1000", "likeCount": "10"});
                if i % 3 != 0 {
                    statistics["commentCount"] = json!("4");
                }
                json!({
                    "id": id,
                    "snippet": {"title": format!("Video {id}"), "publishedAt": "2025-01-01T14:00:00Z"},
                    "contentDetails": {"duration": "PT12M30S"},
                    "statistics": statistics,
                })
            })
            .collect();
        ResponseTemplate::new(200).set_body_json(json!({ "items": items }))
    }
}

async fn mount_channel(server: &MockServer, uploads: &str) {
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("part", "contentDetails"))
        .and(query_param("forHandle", "MrBeast"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{"id": "UCabc", "contentDetails": {"relatedPlaylists": {"likes": "", "uploads": uploads}}}]
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_two_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("playlistId", "UUabc"))
        .and(query_param("maxResults", "50"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(playlist_page(&ids(0..50), Some("CDIQAA"))),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("pageToken", "CDIQAA"))
        .respond_with(ResponseTemplate::new(200).set_body_json(playlist_page(&ids(50..62), None)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_run_over_http() {
    let server = MockServer::start().await;
    mount_channel(&server, "UUabc").await;
    mount_two_pages(&server).await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("part", "contentDetails,snippet,statistics"))
        .respond_with(EchoVideos)
        .expect(2)
        .mount(&server)
        .await;

    let config = config(&server);
    let records = tokio::task::spawn_blocking(move || {
        let pipeline = Pipeline::from_config(&config)?;
        pipeline.run(&ChannelHandle::from("MrBeast"))
    })
    .await
    .unwrap()
    .unwrap();

    assert_eq!(records.len(), 62);
    let returned: Vec<String> = records.iter().map(|r| r.id.0.clone()).collect();
    assert_eq!(returned, ids(0..62));
    assert_eq!(records[0].comment_count, None);
    assert_eq!(records[1].comment_count.as_deref(), Some("4"));
    assert_eq!(records[0].duration, "PT12M30S");

    let batch_sizes: Vec<usize> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/videos")
        .map(|r| {
            r.url
                .query_pairs()
                .find(|(k, _)| k == "id")
                .map(|(_, v)| v.split(',').count())
                .unwrap_or(0)
        })
        .collect();
    assert_eq!(batch_sizes, vec![50, 12]);
}

#[tokio::test]
async fn test_concurrent_enrichment_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(EchoVideos)
        .expect(7)
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.batch_size = 10;
    config.num_workers = 4;
    let wanted: Vec<yt_elt::ItemId> = ids(0..64).into_iter().map(yt_elt::ItemId).collect();
    let expected = wanted.clone();

    let records = tokio::task::spawn_blocking(move || {
        Pipeline::from_config(&config)?.enrich(&wanted)
    })
    .await
    .unwrap()
    .unwrap();

    let returned: Vec<yt_elt::ItemId> = records.into_iter().map(|r| r.id).collect();
    assert_eq!(returned, expected);
}

#[tokio::test]
async fn test_http_error_status_is_request_error_without_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"code": 403, "message": "quotaExceeded"}
        })))
        .mount(&server)
        .await;

    let config = config(&server);
    let err = tokio::task::spawn_blocking(move || {
        Pipeline::from_config(&config)?.resolve_uploads_playlist(&ChannelHandle::from("MrBeast"))
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(matches!(
        err,
        Error::UpstreamRequest {
            endpoint: "channels",
            status: Some(403),
            ..
        }
    ));
    assert!(!err.to_string().contains(KEY));
}

#[tokio::test]
async fn test_unknown_handle_is_shape_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "youtube#channelListResponse",
            "pageInfo": {"totalResults": 0, "resultsPerPage": 5}
        })))
        .mount(&server)
        .await;

    let config = config(&server);
    let err = tokio::task::spawn_blocking(move || {
        Pipeline::from_config(&config)?.resolve_uploads_playlist(&ChannelHandle::from("MrBeast"))
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.is_shape_error(), "{err}");
}

#[tokio::test]
async fn test_non_json_body_is_request_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let config = config(&server);
    let err = tokio::task::spawn_blocking(move || {
        Pipeline::from_config(&config)?.list_all_items(&PlaylistId::from("UUabc"))
    })
    .await
    .unwrap()
    .unwrap_err();

    assert!(err.is_request_error(), "{err}");
}

#[tokio::test]
async fn test_failing_second_page_returns_no_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param_is_missing("pageToken"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(playlist_page(&ids(0..50), Some("CDIQAA"))),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/playlistItems"))
        .and(query_param("pageToken", "CDIQAA"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = config(&server);
    let result = tokio::task::spawn_blocking(move || {
        Pipeline::from_config(&config)?.list_all_items(&PlaylistId::from("UUabc"))
    })
    .await
    .unwrap();

    match result {
        Err(Error::UpstreamRequest { status, .. }) => assert_eq!(status, Some(500)),
        other => panic!("expected request error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_sync_writes_snapshot() {
    let server = MockServer::start().await;
    mount_channel(&server, "UUabc").await;
    mount_two_pages(&server).await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(EchoVideos)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = config(&server);
    config.output_dir = dir.path().join("data");

    let path: PathBuf = tokio::task::spawn_blocking(move || yt_elt::sync(&config))
        .await
        .unwrap()
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("YT_data_") && name.ends_with(".json"), "{name}");
    let saved = yt_elt::storage::load_json(&path).unwrap();
    assert_eq!(saved.len(), 62);
}
