//! Playlist use cases on top of a [`PlaylistStore`].

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use crate::observability::metrics;
use crate::playlist::error::{DataAccessError, ServiceError};
use crate::playlist::models::{
    normalize_tag_names, normalize_title, NewPlaylist, Playlist, PlaylistId, PlaylistUpdate, TagId,
};
use crate::playlist::store::{PlaylistChanges, PlaylistDraft, PlaylistStore};

/// Validates input and delegates to the store. Cheap to clone.
#[derive(Clone)]
pub struct PlaylistService {
    store: Arc<dyn PlaylistStore>,
}

impl PlaylistService {
    pub fn new(store: Arc<dyn PlaylistStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Playlist>, ServiceError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: PlaylistId) -> Result<Playlist, ServiceError> {
        self.store.get(id).await?.ok_or(ServiceError::NotFound(id))
    }

    pub async fn create(&self, input: NewPlaylist) -> Result<Playlist, ServiceError> {
        let draft = PlaylistDraft {
            title: normalize_title(&input.title).map_err(ServiceError::Validation)?,
            description: input.description.trim().to_string(),
            tag_names: normalize_tag_names(&input.tags).map_err(ServiceError::Validation)?,
        };
        Ok(self.store.create(draft).await?)
    }

    pub async fn update(&self, id: PlaylistId, input: PlaylistUpdate) -> Result<Playlist, ServiceError> {
        let changes = PlaylistChanges {
            title: input
                .title
                .as_deref()
                .map(normalize_title)
                .transpose()
                .map_err(ServiceError::Validation)?,
            description: input.description.map(|d| d.trim().to_string()),
            tag_names: input
                .tags
                .as_deref()
                .map(normalize_tag_names)
                .transpose()
                .map_err(ServiceError::Validation)?,
        };
        self.store
            .update(id, changes)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn delete(&self, id: PlaylistId) -> Result<(), ServiceError> {
        if self.store.delete(id).await? {
            Ok(())
        } else {
            Err(ServiceError::NotFound(id))
        }
    }

    /// Playlists sharing at least one of `tags`, never `exclude` itself.
    pub async fn find_recommended(
        &self,
        tags: &BTreeSet<TagId>,
        exclude: PlaylistId,
    ) -> Result<Vec<Playlist>, DataAccessError> {
        let start = Instant::now();
        let result = self.store.find_recommended(tags, exclude).await;

        match &result {
            Ok(playlists) => {
                metrics::record_recommendation(start, playlists.len());
                tracing::debug!(
                    exclude,
                    tag_count = tags.len(),
                    result_count = playlists.len(),
                    "Recommendation query finished"
                );
            }
            Err(e) => {
                tracing::error!(exclude, error = %e, "Recommendation query failed");
            }
        }

        result
    }

    /// Recommendations for a stored playlist, based on its own tags.
    pub async fn recommend_for(&self, id: PlaylistId) -> Result<Vec<Playlist>, ServiceError> {
        let playlist = self.get(id).await?;
        Ok(self.find_recommended(&playlist.tag_ids(), playlist.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::playlist::sqlite::SqliteStore;

    async fn service() -> PlaylistService {
        let config = DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            ..DatabaseConfig::default()
        };
        let store = SqliteStore::connect(&config).await.unwrap();
        PlaylistService::new(Arc::new(store))
    }

    fn new_playlist(title: &str, tags: &[&str]) -> NewPlaylist {
        NewPlaylist {
            title: title.to_string(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_recommend_for_uses_own_tags() {
        let service = service().await;
        let a = service.create(new_playlist("A", &["rock", "pop"])).await.unwrap();
        let b = service.create(new_playlist("B", &["pop"])).await.unwrap();
        service.create(new_playlist("C", &["jazz"])).await.unwrap();

        let for_a = service.recommend_for(a.id).await.unwrap();
        assert_eq!(for_a.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b.id]);

        let for_b = service.recommend_for(b.id).await.unwrap();
        assert_eq!(for_b.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a.id]);
    }

    #[tokio::test]
    async fn test_recommend_for_missing_playlist() {
        let service = service().await;
        let err = service.recommend_for(42).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(42)));
    }

    #[tokio::test]
    async fn test_untagged_playlist_gets_no_recommendations() {
        let service = service().await;
        let lonely = service.create(new_playlist("Lonely", &[])).await.unwrap();
        service.create(new_playlist("Other", &["pop"])).await.unwrap();

        assert!(service.recommend_for(lonely.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_validates_and_normalizes() {
        let service = service().await;

        let err = service.create(new_playlist("   ", &[])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = service.create(new_playlist("Ok", &["pop", ""])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let created = service
            .create(new_playlist(" Focus ", &["lofi", " lofi ", "study"]))
            .await
            .unwrap();
        assert_eq!(created.title, "Focus");
        let names: Vec<_> = created.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["lofi", "study"]);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing() {
        let service = service().await;

        let err = service.update(7, PlaylistUpdate::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(7)));

        let err = service.delete(7).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(7)));
    }

    #[tokio::test]
    async fn test_update_rejects_blank_title() {
        let service = service().await;
        let a = service.create(new_playlist("A", &[])).await.unwrap();

        let update = PlaylistUpdate {
            title: Some(" ".into()),
            ..PlaylistUpdate::default()
        };
        let err = service.update(a.id, update).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.get(a.id).await.unwrap().title, "A");
    }
}
