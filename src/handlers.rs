//! HTTP handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue},
    response::IntoResponse,
    Json,
};

use crate::cache::{CachedProjects, ProjectCache};
use crate::error::ApiError;

/// Response header reporting whether the cache served the request
pub const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// GET /api/projects - the cached project list
pub async fn list_projects(
    State(cache): State<Arc<ProjectCache>>,
) -> Result<impl IntoResponse, ApiError> {
    let CachedProjects { projects, status } = cache.get().await?;
    tracing::debug!(cache = %status, count = projects.len(), "serving projects");

    Ok((
        [(X_CACHE, HeaderValue::from_static(status.as_str()))],
        Json(projects),
    ))
}
