//! Request types for sibling ordering
//!
//! Every orderable resource exposes the same two mutations:
//! `PATCH /{resource}/{id}/move` with [`MoveOrderRequest`] and
//! `PATCH /{resource}/reorder` with [`ReorderRequest`].

use serde::{Deserialize, Serialize};

/// Adjacent move direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Towards position 0
    Up,
    /// Towards the end of the list
    Down,
}

impl MoveDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for MoveDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of `PATCH /{resource}/{id}/move`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveOrderRequest {
    pub direction: MoveDirection,
}

/// Body of `PATCH /{resource}/reorder`
///
/// Older clients name the member after the resource (`categoryId`, `itemId`,
/// `storyId`); those spellings are accepted as aliases.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    #[serde(alias = "categoryId", alias = "itemId", alias = "storyId")]
    pub member_id: i64,
    /// Target position; clamped into the scope's range by the server
    pub new_order: i64,
}
