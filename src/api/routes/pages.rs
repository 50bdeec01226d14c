//! HTML page handlers

use crate::api::{AppState, views};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use axum::{
    extract::{Multipart, State},
    response::Html,
};

/// GET / - landing page with the upload form
pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(views::render_index(&state.config.http.templates_dir).await)
}

/// POST /nzb - list the files of an uploaded NZB
///
/// Expects the manifest in the multipart field `nzb`.
pub async fn upload_nzb(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Html<String>> {
    let mut nzb_content = None;

    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read multipart body: {}", e)))?;
        let Some(field) = field else { break };

        if field.name() != Some("nzb") {
            continue;
        }
        if let Some(filename) = field.file_name() {
            tracing::info!(filename = %filename, "Received NZB upload");
        }
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::BadRequest(format!("Failed to read file: {}", e)))?;
        nzb_content = Some(bytes);
        break;
    }

    let nzb_bytes =
        nzb_content.ok_or_else(|| Error::BadRequest("No NZB file provided in 'nzb' field".into()))?;

    let manifest = Manifest::parse(&nzb_bytes)?;
    Ok(Html(
        views::render_listing(&state.config.http.templates_dir, &manifest).await,
    ))
}
