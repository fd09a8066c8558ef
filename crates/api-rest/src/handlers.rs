//! HTTP handlers.
//!
//! Each handler resolves the tenant, calls one core service and maps the outcome to a status
//! code. Server-side failures are logged here before being reduced to a generic 500.

use crate::dto::{
    EntryRes, FileQuery, HealthRes, ListFilesRes, NameReq, ObjectCountRes, PathQuery, PathRes,
    RenameReq, SearchQuery, SearchRes, UploadQuery, UploadRes,
};
use crate::tenant::Tenant;
use crate::AppState;
use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use futures::{StreamExt, TryStreamExt};
use stowage_core::{paths, FileManagerError};
use stowage_storage::StorageError;

type ApiError = (StatusCode, &'static str);

/// Maps a core failure to a status code, logging according to who is at fault.
fn api_error(context: &str, err: FileManagerError) -> ApiError {
    match &err {
        FileManagerError::InvalidInput(_) => {
            tracing::debug!("{}: {}", context, err);
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        FileManagerError::AlreadyExists(_) => {
            tracing::debug!("{}: {}", context, err);
            (StatusCode::CONFLICT, "Already exists")
        }
        FileManagerError::Storage(StorageError::NotFound { .. }) => {
            tracing::debug!("{}: {}", context, err);
            (StatusCode::NOT_FOUND, "Not found")
        }
        FileManagerError::Storage(StorageError::SizeLimitExceeded { .. }) => {
            tracing::warn!("{}: {}", context, err);
            (StatusCode::PAYLOAD_TOO_LARGE, "Upload exceeds maximum size")
        }
        FileManagerError::Storage(StorageError::InvalidBody { .. }) => {
            tracing::warn!("{}: {}", context, err);
            (StatusCode::BAD_REQUEST, "Invalid request body")
        }
        _ => {
            tracing::error!("{} error: {:?}", context, err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Does not touch the store.
#[axum::debug_handler(state = AppState)]
pub async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Stowage REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/files",
    params(PathQuery),
    responses(
        (status = 200, description = "Directory listing", body = ListFilesRes),
        (status = 400, description = "Malformed path"),
        (status = 401, description = "Missing user id"),
        (status = 500, description = "Internal server error")
    )
)]
/// List a directory
///
/// Returns the immediate children of `path` (directories first) together with the breadcrumb
/// trail for navigation.
#[axum::debug_handler]
pub async fn list_files(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Query(query): Query<PathQuery>,
) -> Result<Json<ListFilesRes>, ApiError> {
    let entries = state
        .files
        .list(&root, &query.path)
        .await
        .map_err(|e| api_error("List files", e))?;

    Ok(Json(ListFilesRes {
        breadcrumbs: paths::breadcrumbs(&query.path).into(),
        path: query.path,
        entries: entries.into_iter().map(EntryRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/files/download",
    params(FileQuery),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Missing user id"),
        (status = 404, description = "File not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Download a file
///
/// The body is streamed from the store as it arrives.
#[axum::debug_handler]
pub async fn download_file(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Query(query): Query<FileQuery>,
) -> Result<Response, ApiError> {
    let body = state
        .files
        .download(&root, &query.path, &query.file)
        .await
        .map_err(|e| api_error("Download file", e))?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        query.file.replace(['"', '\\'], "_")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/files/upload",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "File stored", body = UploadRes),
        (status = 400, description = "Invalid file name or path"),
        (status = 401, description = "Missing user id"),
        (status = 413, description = "Upload exceeds maximum size"),
        (status = 500, description = "Internal server error")
    )
)]
/// Upload a file
///
/// The raw request body is streamed to the store. `Content-Length`, when sent, is used to
/// reject oversized uploads before any data is read.
#[axum::debug_handler]
pub async fn upload_file(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Body,
) -> Result<(StatusCode, Json<UploadRes>), ApiError> {
    let size_hint = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let origin = query.name.clone();
    let stream = body
        .into_data_stream()
        .map_err(move |e| StorageError::InvalidBody {
            origin: origin.clone(),
            source: e.into(),
        })
        .boxed();

    let bytes_written = state
        .files
        .upload(&root, &query.path, &query.name, stream, size_hint)
        .await
        .map_err(|e| api_error("Upload file", e))?;

    Ok((
        StatusCode::CREATED,
        Json(UploadRes {
            path: format!("{}{}", query.path, query.name),
            bytes_written,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/files/rename",
    request_body = RenameReq,
    responses(
        (status = 200, description = "File renamed", body = PathRes),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Missing user id"),
        (status = 404, description = "File not found"),
        (status = 500, description = "Internal server error")
    )
)]
/// Rename a file
///
/// The file keeps its extension; the response carries the resulting path.
#[axum::debug_handler]
pub async fn rename_file(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Json(req): Json<RenameReq>,
) -> Result<Json<PathRes>, ApiError> {
    let path = state
        .files
        .rename(&root, &req.path, &req.old_name, &req.new_name)
        .await
        .map_err(|e| api_error("Rename file", e))?;
    Ok(Json(PathRes { path }))
}

#[utoipa::path(
    post,
    path = "/files/delete",
    request_body = NameReq,
    responses(
        (status = 204, description = "File deleted"),
        (status = 400, description = "Invalid name"),
        (status = 401, description = "Missing user id"),
        (status = 500, description = "Internal server error")
    )
)]
/// Delete a file
#[axum::debug_handler]
pub async fn delete_file(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Json(req): Json<NameReq>,
) -> Result<StatusCode, ApiError> {
    state
        .files
        .delete(&root, &req.path, &req.name)
        .await
        .map_err(|e| api_error("Delete file", e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/directories",
    request_body = NameReq,
    responses(
        (status = 201, description = "Directory created", body = PathRes),
        (status = 400, description = "Invalid directory name"),
        (status = 401, description = "Missing user id"),
        (status = 500, description = "Internal server error")
    )
)]
/// Create a directory
#[axum::debug_handler]
pub async fn create_directory(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Json(req): Json<NameReq>,
) -> Result<(StatusCode, Json<PathRes>), ApiError> {
    let path = state
        .directories
        .create(&root, &req.path, &req.name)
        .await
        .map_err(|e| api_error("Create directory", e))?;
    Ok((StatusCode::CREATED, Json(PathRes { path })))
}

#[utoipa::path(
    post,
    path = "/directories/rename",
    request_body = RenameReq,
    responses(
        (status = 200, description = "Directory renamed", body = ObjectCountRes),
        (status = 400, description = "Invalid directory name"),
        (status = 401, description = "Missing user id"),
        (status = 409, description = "Target directory already exists"),
        (status = 500, description = "Internal server error; the directory may be partially moved")
    )
)]
/// Rename a directory
///
/// Every object under the directory is moved individually. On a 500 the move may have
/// stopped part-way; list both directories before retrying.
#[axum::debug_handler]
pub async fn rename_directory(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Json(req): Json<RenameReq>,
) -> Result<Json<ObjectCountRes>, ApiError> {
    let objects = state
        .directories
        .rename(&root, &req.path, &req.old_name, &req.new_name)
        .await
        .map_err(|e| api_error("Rename directory", e))?;
    Ok(Json(ObjectCountRes { objects }))
}

#[utoipa::path(
    post,
    path = "/directories/delete",
    request_body = NameReq,
    responses(
        (status = 200, description = "Directory deleted", body = ObjectCountRes),
        (status = 400, description = "Invalid directory name"),
        (status = 401, description = "Missing user id"),
        (status = 500, description = "Internal server error; the directory may be partially deleted")
    )
)]
/// Delete a directory and everything below it
#[axum::debug_handler]
pub async fn delete_directory(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Json(req): Json<NameReq>,
) -> Result<Json<ObjectCountRes>, ApiError> {
    let objects = state
        .directories
        .delete(&root, &req.path, &req.name)
        .await
        .map_err(|e| api_error("Delete directory", e))?;
    Ok(Json(ObjectCountRes { objects }))
}

#[utoipa::path(
    get,
    path = "/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching directories then files", body = SearchRes),
        (status = 401, description = "Missing user id"),
        (status = 500, description = "Internal server error")
    )
)]
/// Search file and directory names
#[axum::debug_handler]
pub async fn search(
    State(state): State<AppState>,
    Tenant(root): Tenant,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchRes>, ApiError> {
    let results = state
        .search
        .search(&root, &query.query)
        .await
        .map_err(|e| api_error("Search", e))?;

    Ok(Json(SearchRes {
        query: query.query,
        results: results.into_iter().map(EntryRes::from).collect(),
    }))
}
