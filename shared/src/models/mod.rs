//! Data models
//!
//! Shared between menu-server and frontends (via API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! All IDs are `i64` snowflakes, timestamps are epoch milliseconds.

pub mod menu;
pub mod story;

// Re-exports
pub use menu::*;
pub use story::*;
