//! Request handlers.
//!
//! # Responsibilities
//! - Playlist CRUD and the tag-based recommendation endpoint
//! - Service status and the static route catalogue
//! - JSON 404 for everything the router does not know
//!
//! # Design Decisions
//! - Handlers stay thin: extract, call [`PlaylistService`], map errors
//! - Inputs go through [`ApiPath`] / [`ApiJson`] so bad ids and bodies
//!   get the same JSON error body as every other failure
//! - Mutating handlers require the [`Principal`] attached by access control
//!
//! [`PlaylistService`]: crate::playlist::PlaylistService

use axum::{
    extract::State,
    http::{Method, StatusCode, Uri},
    Extension, Json,
};
use serde::Serialize;

use crate::http::request::{ApiJson, ApiPath};
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::playlist::{NewPlaylist, Playlist, PlaylistId, PlaylistUpdate};
use crate::security::Principal;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
}

pub async fn list_playlists(State(state): State<AppState>) -> Result<Json<Vec<Playlist>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

pub async fn get_playlist(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PlaylistId>,
) -> Result<Json<Playlist>, ApiError> {
    Ok(Json(state.service.get(id).await?))
}

pub async fn create_playlist(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiJson(input): ApiJson<NewPlaylist>,
) -> Result<(StatusCode, Json<Playlist>), ApiError> {
    let playlist = state.service.create(input).await?;
    tracing::info!(playlist_id = playlist.id, principal = %principal, "Playlist created");
    Ok((StatusCode::CREATED, Json(playlist)))
}

pub async fn update_playlist(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<PlaylistId>,
    ApiJson(input): ApiJson<PlaylistUpdate>,
) -> Result<Json<Playlist>, ApiError> {
    let playlist = state.service.update(id, input).await?;
    tracing::info!(playlist_id = id, principal = %principal, "Playlist updated");
    Ok(Json(playlist))
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    ApiPath(id): ApiPath<PlaylistId>,
) -> Result<StatusCode, ApiError> {
    state.service.delete(id).await?;
    tracing::info!(playlist_id = id, principal = %principal, "Playlist deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn recommend_playlists(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<PlaylistId>,
) -> Result<Json<Vec<Playlist>>, ApiError> {
    let playlists = state.service.recommend_for(id).await?;
    tracing::debug!(playlist_id = id, result_count = playlists.len(), "Recommendations served");
    Ok(Json(playlists))
}

pub async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// Static route catalogue.
pub async fn api_docs() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "openapi": "3.0.1",
        "info": {
            "title": "Playlist curation API",
            "version": env!("CARGO_PKG_VERSION")
        },
        "paths": {
            "/api/v1/playlists": {
                "get": { "summary": "List playlists", "security": [] },
                "post": { "summary": "Create a playlist", "security": [{ "bearer": [] }] }
            },
            "/api/v1/playlists/{id}": {
                "get": { "summary": "Get a playlist", "security": [] },
                "put": { "summary": "Update a playlist", "security": [{ "bearer": [] }] },
                "delete": { "summary": "Delete a playlist", "security": [{ "bearer": [] }] }
            },
            "/api/v1/playlists/{id}/recommendation": {
                "get": {
                    "summary": "Playlists sharing at least one tag",
                    "security": [{ "bearer": [] }]
                }
            }
        },
        "components": {
            "securitySchemes": {
                "bearer": { "type": "http", "scheme": "bearer" }
            }
        }
    }))
}

pub async fn fallback(method: Method, uri: Uri) -> ApiError {
    ApiError::NotFound(format!("no route for {} {}", method, uri.path()))
}
