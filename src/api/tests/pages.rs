use super::*;

const UPLOAD_NZB: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE nzb PUBLIC "-//newzBin//DTD NZB 1.1//EN" "http://www.newzbin.com/DTD/nzb/nzb-1.1.dtd">
<nzb xmlns="http://www.newzbin.com/DTD/2003/nzb">
  <head>
    <meta type="title">Clip</meta>
  </head>
  <file poster="test@example.com" date="1234567890" subject="&quot;clip.mp4&quot; yEnc (1/3)">
    <groups>
      <group>alt.test</group>
    </groups>
    <segments>
      <segment bytes="1000" number="1">p1@x</segment>
      <segment bytes="1000" number="2">p2@x</segment>
      <segment bytes="500" number="3">p3@x</segment>
    </segments>
  </file>
</nzb>"#;

const BOUNDARY: &str = "----usenetstreamboundary";

fn multipart_request(field: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"{field}\"; filename=\"upload.nzb\"\r\n\
         Content-Type: application/x-nzb\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Request::builder()
        .method("POST")
        .uri("/nzb")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn index_serves_upload_form() {
    let (app, _dir) = test_router(stub_server());

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    let page = std::str::from_utf8(&body).unwrap();
    assert!(page.contains("action=\"/nzb\""));
}

#[tokio::test]
async fn upload_lists_files_with_download_forms() {
    let (app, _dir) = test_router(stub_server());

    let response = app
        .oneshot(multipart_request("nzb", UPLOAD_NZB))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_bytes(response).await;
    let page = std::str::from_utf8(&body).unwrap();
    assert!(page.contains("<p>File: clip.mp4 (2.5 kB)<br/>"));
    assert!(page.contains("value=\"p1@x\np2@x\np3@x\n\""));
}

#[tokio::test]
async fn upload_without_nzb_field_is_bad_request() {
    let (app, _dir) = test_router(stub_server());

    let response = app
        .oneshot(multipart_request("file", UPLOAD_NZB))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn upload_of_invalid_nzb_is_bad_request() {
    let (app, _dir) = test_router(stub_server());

    let response = app
        .oneshot(multipart_request("nzb", "<nzb><broken"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
