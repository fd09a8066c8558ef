//! Tenant extraction.
//!
//! Authentication happens in front of this service; by the time a request arrives the caller's
//! user id is carried in the `x-user-id` header.

use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use stowage_core::TenantRoot;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The calling tenant's root, resolved from the `x-user-id` header.
#[derive(Debug, Clone)]
pub struct Tenant(pub TenantRoot);

#[async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or((StatusCode::UNAUTHORIZED, "Missing user id"))?;

        let root = state.cfg.tenant_layout().root_for(user_id).map_err(|e| {
            tracing::debug!("Rejected user id: {}", e);
            (StatusCode::UNAUTHORIZED, "Invalid user id")
        })?;

        Ok(Tenant(root))
    }
}
