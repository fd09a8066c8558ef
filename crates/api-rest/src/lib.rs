//! # API REST
//!
//! REST API for Stowage.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, tenant header, streamed bodies)
//!
//! All file-system semantics live in `stowage-core`; this crate only translates requests.

#![warn(rust_2018_idioms)]

pub mod dto;
pub mod handlers;
pub mod tenant;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use stowage_core::{CoreConfig, DirectoryService, FileService, SearchService};
use stowage_storage::ObjectStore;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state for the REST API server
///
/// Shared by every handler. Services are cheap to clone; they all point at the same store.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub files: FileService,
    pub directories: DirectoryService,
    pub search: SearchService,
}

impl AppState {
    pub fn new(store: Arc<dyn ObjectStore>, cfg: Arc<CoreConfig>) -> Self {
        Self {
            files: FileService::new(store.clone(), cfg.clone()),
            directories: DirectoryService::new(store.clone(), cfg.clone()),
            search: SearchService::new(store),
            cfg,
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health,
        handlers::list_files,
        handlers::download_file,
        handlers::upload_file,
        handlers::rename_file,
        handlers::delete_file,
        handlers::create_directory,
        handlers::rename_directory,
        handlers::delete_directory,
        handlers::search,
    ),
    components(schemas(
        dto::HealthRes,
        dto::EntryRes,
        dto::BreadcrumbsRes,
        dto::ListFilesRes,
        dto::UploadRes,
        dto::RenameReq,
        dto::NameReq,
        dto::PathRes,
        dto::ObjectCountRes,
        dto::SearchRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full router, Swagger UI included.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/files", get(handlers::list_files))
        .route("/files/download", get(handlers::download_file))
        .route("/files/upload", post(handlers::upload_file))
        .route("/files/rename", post(handlers::rename_file))
        .route("/files/delete", post(handlers::delete_file))
        .route("/directories", post(handlers::create_directory))
        .route("/directories/rename", post(handlers::rename_directory))
        .route("/directories/delete", post(handlers::delete_directory))
        .route("/search", get(handlers::search))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
