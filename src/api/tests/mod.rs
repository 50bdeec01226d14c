use super::*;
use crate::error::DecodeError;
use crate::stream::{ArticleSource, SegmentDecoder, SessionOpener, StreamOptions, StreamService};
use crate::types::DecodedSegment;
use axum::body::{Body, Bytes};
use axum::http::{Request, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tower::ServiceExt;

mod download;
mod pages;

/// News server stub: articles present in the map are returned with the
/// message-id as body; everything else is missing.
#[derive(Clone, Default)]
struct StubServer {
    reachable: bool,
    segments: Arc<HashMap<String, DecodedSegment>>,
}

#[async_trait::async_trait]
impl ArticleSource for StubServer {
    async fn fetch_body(&mut self, message_id: &str) -> nntp_rs::Result<Vec<u8>> {
        if self.segments.contains_key(message_id) {
            Ok(message_id.as_bytes().to_vec())
        } else {
            Err(nntp_rs::NntpError::NoSuchArticle(message_id.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl SessionOpener for StubServer {
    async fn open(&self) -> nntp_rs::Result<Box<dyn ArticleSource>> {
        if self.reachable {
            Ok(Box::new(self.clone()))
        } else {
            Err(nntp_rs::NntpError::Other("connection refused".into()))
        }
    }
}

impl SegmentDecoder for StubServer {
    fn decode(&self, raw: &[u8]) -> std::result::Result<DecodedSegment, DecodeError> {
        let not_a_segment = || DecodeError::Payload("not a segment".to_string());
        let id = std::str::from_utf8(raw).map_err(|_| not_a_segment())?;
        self.segments.get(id).cloned().ok_or_else(not_a_segment)
    }
}

/// 250-byte file in parts of 100, 100 and 50
fn stub_server() -> StubServer {
    let part = |number: u32, byte: u8, len: usize| DecodedSegment {
        number,
        name: "clip.mp4".to_string(),
        nominal_size: 100,
        declared_output_length: 250,
        payload: Bytes::from(vec![byte; len]),
    };
    let segments = HashMap::from([
        ("<p1@x>".to_string(), part(1, b'1', 100)),
        ("<p2@x>".to_string(), part(2, b'2', 100)),
        ("<p3@x>".to_string(), part(3, b'3', 50)),
    ]);
    StubServer {
        reachable: true,
        segments: Arc::new(segments),
    }
}

fn test_state(server: StubServer, templates_dir: &std::path::Path) -> AppState {
    let mut config = Config::default();
    config.http.templates_dir = templates_dir.to_path_buf();
    config.http.static_dir = templates_dir.join("static");
    let server = Arc::new(server);
    let service = StreamService::new(
        server.clone(),
        server,
        StreamOptions::default(),
        16,
        4,
    );
    AppState::new(Arc::new(config), Arc::new(service))
}

fn test_router(server: StubServer) -> (Router, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let router = create_router(test_state(server, dir.path()));
    (router, dir)
}

async fn body_bytes(response: axum::response::Response) -> Bytes {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
}

#[tokio::test]
async fn static_files_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("static")).unwrap();
    std::fs::write(dir.path().join("static").join("style.css"), "body {}").unwrap();
    let app = create_router(test_state(stub_server(), dir.path()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/static/style.css")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(&body_bytes(response).await[..], b"body {}");
}

#[tokio::test]
async fn server_stops_when_token_is_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let state = test_state(stub_server(), dir.path());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let shutdown = CancellationToken::new();

    let handle = tokio::spawn(serve(listener, state, shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
