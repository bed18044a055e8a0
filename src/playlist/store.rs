//! Persistence boundary for playlists.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::playlist::error::DataAccessError;
use crate::playlist::models::{Playlist, PlaylistId, TagId};

/// Validated input for inserting a playlist.
#[derive(Debug, Clone)]
pub struct PlaylistDraft {
    pub title: String,
    pub description: String,
    pub tag_names: Vec<String>,
}

/// Validated partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct PlaylistChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tag_names: Option<Vec<String>>,
}

/// Read/write access to stored playlists.
///
/// Implementations must be safe to share between request tasks.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Playlist>, DataAccessError>;

    async fn get(&self, id: PlaylistId) -> Result<Option<Playlist>, DataAccessError>;

    /// Insert a playlist, creating any tags that do not exist yet.
    async fn create(&self, draft: PlaylistDraft) -> Result<Playlist, DataAccessError>;

    async fn update(
        &self,
        id: PlaylistId,
        changes: PlaylistChanges,
    ) -> Result<Option<Playlist>, DataAccessError>;

    /// Returns false when no playlist had this id.
    async fn delete(&self, id: PlaylistId) -> Result<bool, DataAccessError>;

    /// Every playlist sharing at least one tag in `tags`, excluding
    /// `exclude`, each listed once. Order is not part of the contract.
    /// An empty `tags` set yields an empty result.
    async fn find_recommended(
        &self,
        tags: &BTreeSet<TagId>,
        exclude: PlaylistId,
    ) -> Result<Vec<Playlist>, DataAccessError>;
}
