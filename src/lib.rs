//! Playlist curation service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod playlist;
pub mod routing;
pub mod security;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
