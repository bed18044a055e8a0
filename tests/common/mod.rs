//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;

use playlist_curation::config::{AppConfig, TokenConfig};
use playlist_curation::http::HttpServer;
use playlist_curation::lifecycle::Shutdown;
use playlist_curation::playlist::{PlaylistService, SqliteStore};
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-token";
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// A running server on a loopback port, backed by an in-memory store.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown: Shutdown,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_server() -> TestServer {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.database.url = "sqlite::memory:".into();
    config.auth.tokens.push(TokenConfig {
        token: TOKEN.into(),
        principal: "curator".into(),
    });

    let store = SqliteStore::connect(&config.database).await.unwrap();
    let service = PlaylistService::new(Arc::new(store));

    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config, service).unwrap();
    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    TestServer { addr, shutdown }
}

pub fn bearer() -> String {
    format!("Bearer {}", TOKEN)
}
