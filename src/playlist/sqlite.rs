//! SQLite-backed playlist store.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePoolOptions};
use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::config::DatabaseConfig;
use crate::playlist::error::DataAccessError;
use crate::playlist::models::{Playlist, PlaylistId, Tag, TagId};
use crate::playlist::schema;
use crate::playlist::store::{PlaylistChanges, PlaylistDraft, PlaylistStore};

const PLAYLIST_COLUMNS: &str = "p.id, p.title, p.description, p.created_at, p.updated_at";

#[derive(Debug, sqlx::FromRow)]
struct PlaylistRow {
    id: i64,
    title: String,
    description: String,
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct TagLinkRow {
    playlist_id: i64,
    id: i64,
    name: String,
}

/// Connection pool wrapper implementing [`PlaylistStore`].
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open the pool described by `config` and run migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DataAccessError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs));

        if config.is_in_memory() {
            // Every connection to :memory: is a separate database; pin exactly one.
            pool_options = pool_options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = pool_options.connect_with(options).await?;
        schema::run_migrations(&pool).await?;

        tracing::info!(
            url = %config.url,
            max_connections = config.max_connections,
            "Playlist store ready"
        );

        Ok(Self { pool })
    }

    /// Close all pooled connections, waiting for in-flight queries.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl PlaylistStore for SqliteStore {
    async fn list(&self) -> Result<Vec<Playlist>, DataAccessError> {
        let mut conn = self.pool.acquire().await?;
        let rows: Vec<PlaylistRow> = sqlx::query_as(&format!(
            "SELECT {} FROM playlists p ORDER BY p.id",
            PLAYLIST_COLUMNS
        ))
        .fetch_all(&mut *conn)
        .await?;

        Ok(hydrate(&mut conn, rows).await?)
    }

    async fn get(&self, id: PlaylistId) -> Result<Option<Playlist>, DataAccessError> {
        let mut conn = self.pool.acquire().await?;
        let row = fetch_row(&mut conn, id).await?;

        match row {
            Some(row) => Ok(hydrate(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn create(&self, draft: PlaylistDraft) -> Result<Playlist, DataAccessError> {
        let now = unix_now();
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query(
            "INSERT INTO playlists (title, description, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let mut tags = upsert_tags(&mut tx, &draft.tag_names).await?;
        link_tags(&mut tx, id, &tags).await?;
        tx.commit().await?;

        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(playlist_id = id, tag_count = tags.len(), "Playlist created");

        Ok(Playlist {
            id,
            title: draft.title,
            description: draft.description,
            tags,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(
        &self,
        id: PlaylistId,
        changes: PlaylistChanges,
    ) -> Result<Option<Playlist>, DataAccessError> {
        let mut tx = self.pool.begin().await?;

        let Some(current) = fetch_row(&mut tx, id).await? else {
            return Ok(None);
        };

        let updated = PlaylistRow {
            id,
            title: changes.title.unwrap_or(current.title),
            description: changes.description.unwrap_or(current.description),
            created_at: current.created_at,
            updated_at: unix_now(),
        };

        sqlx::query("UPDATE playlists SET title = ?, description = ?, updated_at = ? WHERE id = ?")
            .bind(&updated.title)
            .bind(&updated.description)
            .bind(updated.updated_at)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if let Some(names) = &changes.tag_names {
            sqlx::query("DELETE FROM playlist_tags WHERE playlist_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            let tags = upsert_tags(&mut tx, names).await?;
            link_tags(&mut tx, id, &tags).await?;
        }

        let playlist = hydrate(&mut tx, vec![updated]).await?.pop();
        tx.commit().await?;

        Ok(playlist)
    }

    async fn delete(&self, id: PlaylistId) -> Result<bool, DataAccessError> {
        // playlist_tags rows go with it through ON DELETE CASCADE
        let removed = sqlx::query("DELETE FROM playlists WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(removed > 0)
    }

    async fn find_recommended(
        &self,
        tags: &BTreeSet<TagId>,
        exclude: PlaylistId,
    ) -> Result<Vec<Playlist>, DataAccessError> {
        if tags.is_empty() {
            tracing::debug!(exclude, "Empty tag set, nothing to recommend");
            return Ok(Vec::new());
        }

        let mut conn = self.pool.acquire().await?;

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT DISTINCT {} FROM playlists p \
             JOIN playlist_tags pt ON pt.playlist_id = p.id \
             WHERE pt.tag_id IN (",
            PLAYLIST_COLUMNS
        ));
        let mut ids = query.separated(", ");
        for tag in tags {
            ids.push_bind(*tag);
        }
        ids.push_unseparated(") AND p.id <> ");
        query.push_bind(exclude);
        query.push(" ORDER BY p.id");

        let rows: Vec<PlaylistRow> = query.build_query_as().fetch_all(&mut *conn).await?;
        Ok(hydrate(&mut conn, rows).await?)
    }
}

async fn fetch_row(
    conn: &mut SqliteConnection,
    id: PlaylistId,
) -> Result<Option<PlaylistRow>, sqlx::Error> {
    sqlx::query_as(&format!(
        "SELECT {} FROM playlists p WHERE p.id = ?",
        PLAYLIST_COLUMNS
    ))
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Attach tags to playlist rows, preserving row order.
async fn hydrate(
    conn: &mut SqliteConnection,
    rows: Vec<PlaylistRow>,
) -> Result<Vec<Playlist>, sqlx::Error> {
    let ids: Vec<PlaylistId> = rows.iter().map(|r| r.id).collect();
    let mut tags = load_tags(conn, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| Playlist {
            tags: tags.remove(&row.id).unwrap_or_default(),
            id: row.id,
            title: row.title,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
        .collect())
}

async fn load_tags(
    conn: &mut SqliteConnection,
    playlist_ids: &[PlaylistId],
) -> Result<HashMap<PlaylistId, Vec<Tag>>, sqlx::Error> {
    let mut by_playlist: HashMap<PlaylistId, Vec<Tag>> = HashMap::new();
    if playlist_ids.is_empty() {
        return Ok(by_playlist);
    }

    let mut query = QueryBuilder::<Sqlite>::new(
        "SELECT pt.playlist_id, t.id, t.name FROM playlist_tags pt \
         JOIN tags t ON t.id = pt.tag_id WHERE pt.playlist_id IN (",
    );
    let mut ids = query.separated(", ");
    for id in playlist_ids {
        ids.push_bind(*id);
    }
    ids.push_unseparated(") ORDER BY t.name");

    let links: Vec<TagLinkRow> = query.build_query_as().fetch_all(&mut *conn).await?;
    for link in links {
        by_playlist.entry(link.playlist_id).or_default().push(Tag {
            id: link.id,
            name: link.name,
        });
    }

    Ok(by_playlist)
}

/// Get-or-create each tag by name.
async fn upsert_tags(conn: &mut SqliteConnection, names: &[String]) -> Result<Vec<Tag>, sqlx::Error> {
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        sqlx::query("INSERT OR IGNORE INTO tags (name) VALUES (?)")
            .bind(name)
            .execute(&mut *conn)
            .await?;
        let tag: Tag = sqlx::query_as("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_one(&mut *conn)
            .await?;
        tags.push(tag);
    }
    Ok(tags)
}

async fn link_tags(conn: &mut SqliteConnection, playlist_id: PlaylistId, tags: &[Tag]) -> Result<(), sqlx::Error> {
    for tag in tags {
        sqlx::query("INSERT OR IGNORE INTO playlist_tags (playlist_id, tag_id) VALUES (?, ?)")
            .bind(playlist_id)
            .bind(tag.id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
