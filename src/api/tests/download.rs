use super::*;

fn msgids_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/msgids")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn complete_file_is_streamed_with_framing_headers() {
    let (app, _dir) = test_router(stub_server());

    let response = app
        .oneshot(msgids_request("msgids=p1%40x%0Ap2%40x%0Ap3%40x%0A"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["content-type"], "application/octet-stream");
    assert_eq!(headers["content-disposition"], "attachment; filename=clip.mp4");
    assert_eq!(headers["content-length"], "250");

    let body = body_bytes(response).await;
    assert_eq!(body.len(), 250);
    assert!(body[..100].iter().all(|&b| b == b'1'));
    assert!(body[100..200].iter().all(|&b| b == b'2'));
    assert!(body[200..].iter().all(|&b| b == b'3'));
}

#[tokio::test]
async fn missing_segment_is_zero_filled() {
    let (app, _dir) = test_router(stub_server());

    let response = app
        .oneshot(msgids_request("msgids=p1%40x%0Agone%40x%0Ap3%40x"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    assert_eq!(body.len(), 250);
    assert!(body[100..200].iter().all(|&b| b == 0));
    assert!(body[200..].iter().all(|&b| b == b'3'));
}

#[tokio::test]
async fn list_without_part_one_is_not_found() {
    let (app, _dir) = test_router(stub_server());

    let response = app
        .oneshot(msgids_request("msgids=p2%40x%0Ap3%40x%0A"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("content-disposition").is_none());
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn carriage_returns_are_accepted() {
    let (app, _dir) = test_router(stub_server());

    let response = app
        .oneshot(msgids_request("msgids=p1%40x%0D%0Ap2%40x%0D%0Ap3%40x%0D%0A"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.len(), 250);
}

#[tokio::test]
async fn unreachable_server_is_internal_error() {
    let server = StubServer {
        reachable: false,
        ..stub_server()
    };
    let (app, _dir) = test_router(server);

    let response = app
        .oneshot(msgids_request("msgids=p1%40x"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn empty_or_missing_msgids_is_bad_request() {
    for body in ["msgids=", "other=1"] {
        let (app, _dir) = test_router(stub_server());
        let response = app.oneshot(msgids_request(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body {body:?}");
    }
}
