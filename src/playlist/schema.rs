//! Database schema migrations

use sqlx::{Pool, Sqlite};

/// Create tables and indexes if they are missing. Safe to run on every start.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlists (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Join relation; neither side owns the other
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS playlist_tags (
            playlist_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            PRIMARY KEY (playlist_id, tag_id),
            FOREIGN KEY (playlist_id) REFERENCES playlists(id) ON DELETE CASCADE,
            FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_playlist_tags_tag ON playlist_tags(tag_id);
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
