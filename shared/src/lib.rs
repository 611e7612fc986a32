//! Shared types for the menu service
//!
//! Wire models, ordering request types and the unified error system used by
//! menu-server and its API clients.

pub mod error;
pub mod models;
pub mod request;
pub mod util;

// Re-exports
pub use axum::Json;
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{AppError, ErrorBody, ErrorCode};
pub use request::{MoveDirection, MoveOrderRequest, ReorderRequest};
