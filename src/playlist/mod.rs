//! Playlist domain: types, persistence and recommendation.
//!
//! # Data Flow
//! ```text
//! HTTP handler
//!     → service.rs (validation, recommendation use cases)
//!     → store.rs (PlaylistStore trait)
//!     → sqlite.rs (sqlx queries over playlists / tags / playlist_tags)
//! ```
//!
//! # Design Decisions
//! - Playlist ↔ tag is a single join relation; neither side owns the other
//! - Recommendation is one read-only query with no caching
//! - Empty tag set recommends nothing rather than failing

pub mod error;
pub mod models;
pub mod schema;
pub mod service;
pub mod sqlite;
pub mod store;

pub use error::{DataAccessError, ServiceError};
pub use models::{NewPlaylist, Playlist, PlaylistId, PlaylistUpdate, Tag, TagId};
pub use service::PlaylistService;
pub use sqlite::SqliteStore;
pub use store::PlaylistStore;
