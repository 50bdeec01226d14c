//! Download handler

use crate::api::AppState;
use crate::api::routes::MsgIdsForm;
use crate::error::{Error, Result};
use crate::types::DownloadRequest;
use axum::{
    Form,
    body::Body,
    extract::{State, rejection::FormRejection},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_stream::wrappers::ReceiverStream;

/// POST /msgids - stream the file whose segments are listed in `msgids`
///
/// The status is decided by the first segment: 404 when it is not part 1,
/// 500 when the news server is unreachable. Once headers are sent the body
/// always ends at exactly `Content-Length` bytes unless the client leaves.
pub async fn download(
    State(state): State<AppState>,
    form: std::result::Result<Form<MsgIdsForm>, FormRejection>,
) -> Result<Response> {
    let Form(form) =
        form.map_err(|e| Error::BadRequest(format!("Invalid msgids form: {}", e)))?;
    let request = DownloadRequest::parse(&form.msgids)?;

    tracing::debug!(segments = request.len(), "Download requested");

    let response = state.service.spawn(request);
    let framing = response
        .framing
        .await
        .map_err(|_| Error::Other("download task ended without a response".into()))??;

    let content_disposition = HeaderValue::from_str(&framing.content_disposition())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, content_disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(framing.content_length)),
        ],
        Body::from_stream(ReceiverStream::new(response.body)),
    )
        .into_response())
}
