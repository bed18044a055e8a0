//! Request matching primitives.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → matcher.rs (evaluate method / path conditions)
//!     → consumer decides (access policy rule, handler table)
//!
//! Pattern Compilation (at startup):
//!     "/api/v1/playlists/{id}"
//!     → PathPattern (segment list)
//!     → frozen, shared read-only
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - No regex in hot path (segment comparison only)
//! - Deterministic: same input always gives the same answer

pub mod matcher;

pub use matcher::{AndMatcher, AnyMatcher, Matcher, MethodMatcher, PathMatcher, PathPattern, PatternError};
