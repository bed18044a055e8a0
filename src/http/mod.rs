//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → security (CORS, access policy)
//!     → handlers.rs (playlist endpoints)
//!     → response.rs (error mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ApiJson, ApiPath, MakeRequestUuid, RequestIdExt, X_REQUEST_ID};
pub use response::ApiError;
pub use server::{AppState, HttpServer};
