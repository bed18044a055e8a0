//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (reject foreign origins, answer preflights)
//!     → access_control.rs (access_policy.rs decides, auth.rs authenticates)
//!     → Pass to handlers
//! ```
//!
//! # Design Decisions
//! - Fail closed: routes no rule names require authentication
//! - Stateless bearer tokens, no cookie session, so no CSRF layer
//! - Policy, token table and CORS allow-list are frozen at startup

pub mod access_control;
pub mod access_policy;
pub mod auth;
pub mod cors;

pub use access_control::{access_control_middleware, AccessControlState};
pub use access_policy::{AccessLevel, AccessPolicy, AccessRule};
pub use auth::{Principal, TokenStore};
pub use cors::{cors_guard_middleware, CorsPolicy};
