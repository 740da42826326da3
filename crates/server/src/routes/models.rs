use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use service::auth::domain::AuthUser;
use service::listing::domain::{FileSlot, ListingDetail, ListingSummary, ModelDraft, UploadedFile};
use service::pagination::CursorPage;

use super::auth::ServerState;
use crate::errors::ApiError;

pub const CREATED_MESSAGE: &str = "Model created successfully!";

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub cursor: Option<String>,
}

#[derive(Serialize)]
pub struct CreatedOutput {
    pub message: &'static str,
    pub model: ListingDetail,
}

#[utoipa::path(
    get,
    path = "/models",
    tag = "models",
    params(("cursor" = Option<String>, Query, description = "Opaque cursor from next_cursor / prev_cursor")),
    responses((status = 200, description = "One page of listings, newest first", body = crate::openapi::ListingPageDoc))
)]
pub async fn index(
    State(state): State<ServerState>,
    Query(q): Query<IndexQuery>,
) -> Result<Json<CursorPage<ListingSummary>>, ApiError> {
    let path = format!("{}/models", state.public_url);
    let page = state.listings.list(q.cursor.as_deref(), &path).await?;
    Ok(Json(page))
}

/// Collect the multipart body into a draft; file inputs by field name, text otherwise.
async fn read_draft(mut multipart: Multipart) -> Result<ModelDraft, ApiError> {
    let mut draft = ModelDraft::new();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match FileSlot::from_field(&name) {
            Some(slot) => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await?;
                draft = draft.with_file(slot, UploadedFile::new(file_name, data));
            }
            None => {
                let text = field.text().await?;
                draft = draft.with_field(&name, text);
            }
        }
    }
    Ok(draft)
}

#[utoipa::path(
    post,
    path = "/models",
    tag = "models",
    request_body(content = crate::openapi::ModelUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Created", body = crate::openapi::CreatedDoc),
        (status = 401, description = "Unauthenticated"),
        (status = 422, description = "Field-keyed validation errors"),
        (status = 500, description = "Storage or database failure")
    )
)]
pub async fn store(
    State(state): State<ServerState>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CreatedOutput>), ApiError> {
    let draft = read_draft(multipart).await?;
    let today = chrono::Utc::now().date_naive();
    let model = state.listings.create(user.id, &draft, today).await?;
    Ok((StatusCode::CREATED, Json(CreatedOutput { message: CREATED_MESSAGE, model })))
}

#[utoipa::path(
    get,
    path = "/models/{id}",
    tag = "models",
    params(("id" = i64, Path, description = "Listing id")),
    responses((status = 200, description = "Listing with author and category"), (status = 404, description = "Not found"))
)]
pub async fn show(State(state): State<ServerState>, Path(id): Path<i64>) -> Result<Json<ListingDetail>, ApiError> {
    Ok(Json(state.listings.show(id).await?))
}

pub async fn update(Path(_id): Path<i64>) -> ApiError { ApiError::NotImplemented }

pub async fn destroy(Path(_id): Path<i64>) -> ApiError { ApiError::NotImplemented }
