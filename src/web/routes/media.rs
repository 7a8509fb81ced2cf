use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::post,
};

use crate::{
    model::{
        Capability, CrudRepository, ResourceTyped,
        entity::{MediaAsset, MediaAssetCreate},
    },
    utils::uploads::{discard_upload, sanitize_file_name, store_upload, stored_name_for},
    web::{
        AppState, RequestContext, WebError, WebResult, dto::common::UploadResponse,
        error::ErrorResponse, middlewares,
    },
};

/// Form field carrying the file.
pub const UPLOAD_FIELD: &str = "file";
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

pub fn routes<S>(state: AppState) -> Router<S> {
    Router::new()
        .route("/media", post(media_upload_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            middlewares::extract_context_fn,
        ))
        .with_state(state)
}

#[utoipa::path(
    post,
    path = "/api/v1/studio/media",
    request_body(content_type = "multipart/form-data", description = "Single `file` field"),
    description = "Stores an uploaded file and returns its id and public url",
    responses(
        (status = 200, description = "File stored", body = UploadResponse),
        (status = 400, description = "No file in the form", body = ErrorResponse),
        (status = 403, description = "Studio access required", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse),
    ),
    tag = "studio",
    security(("cookie" = []), ("token" = []))
)]
async fn media_upload_handler(
    ctx: RequestContext,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> WebResult<impl IntoResponse> {
    let user = ctx.user_with(Capability::UseStudio)?;

    let bad_form =
        |reason: String| WebError::resource_bad_request(MediaAsset::get_resource_type(), reason);

    while let Some(field) = multipart.next_field().await.map_err(|e| bad_form(e.body_text()))? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = sanitize_file_name(field.file_name().unwrap_or_default());
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(|e| bad_form(e.body_text()))?;
        if bytes.is_empty() {
            return Err(bad_form(String::from("Uploaded file is empty.")));
        }

        let stored_name = stored_name_for(&filename);
        let path = store_upload(state.uploads_dir(), &stored_name, &bytes)
            .await
            .map_err(WebError::server_io_error)?;

        let created = MediaAsset::create(
            state.pool(),
            user,
            MediaAssetCreate {
                filename,
                stored_name,
                mime,
            },
        )
        .await;
        let asset = match created {
            Ok(asset) => asset,
            Err(e) => {
                if let Err(io) = discard_upload(&path).await {
                    tracing::warn!(path = %path.display(), "orphaned upload left behind: {io}");
                }
                return Err(WebError::resource_fetch_error(
                    MediaAsset::get_resource_type(),
                    e,
                ));
            }
        };

        tracing::info!(media_id = asset.id(), size = bytes.len(), "media stored");
        return Ok((
            StatusCode::OK,
            Json(UploadResponse {
                success: true,
                id: asset.id(),
                url: asset.url(),
            }),
        ));
    }

    Err(bad_form(String::from("No file uploaded.")))
}
