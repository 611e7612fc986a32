//! Numeric error codes
//!
//! - 0xxx: General errors
//! - 1xxx: Ordering errors (sibling positions)
//! - 2xxx: Menu errors
//! - 3xxx: Story errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried in every error body
///
/// Serialized as its bare `u16` so API clients can switch on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // 0xxx: General
    ValidationFailed = 2,
    NotFound = 3,
    /// The record is still referenced and cannot go away
    AlreadyExists = 4,

    // 1xxx: Ordering
    /// Target position cannot be represented in the scope
    PositionOutOfRange = 1001,
    /// Concurrent modification of the same scope, retry the whole operation
    OrderingConflict = 1002,
    /// Member cannot be moved into a scope of another kind
    ScopeMismatch = 1003,

    // 2xxx: Menu
    PrimaryCategoryNotFound = 2001,
    /// Primary category still owns menu categories
    PrimaryCategoryHasCategories = 2002,
    MenuCategoryNotFound = 2101,
    /// Menu category still owns menu items
    MenuCategoryHasItems = 2102,
    MenuItemNotFound = 2201,
    MenuItemInvalidPrice = 2202,

    // 3xxx: Story
    StoryCategoryNotFound = 3001,
    StoryNotFound = 3101,

    // 9xxx: System
    DatabaseError = 9002,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether the client may safely repeat the whole request
    #[inline]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, ErrorCode::OrderingConflict)
    }

    /// Default message when the caller supplies none
    pub const fn message(&self) -> &'static str {
        match self {
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource is still in use",
            ErrorCode::PositionOutOfRange => "Target position is out of range",
            ErrorCode::OrderingConflict => "Concurrent modification, please retry",
            ErrorCode::ScopeMismatch => "Member cannot be moved into this scope",
            ErrorCode::PrimaryCategoryNotFound => "Primary category not found",
            ErrorCode::PrimaryCategoryHasCategories => "Primary category still has categories",
            ErrorCode::MenuCategoryNotFound => "Menu category not found",
            ErrorCode::MenuCategoryHasItems => "Menu category still has items",
            ErrorCode::MenuItemNotFound => "Menu item not found",
            ErrorCode::MenuItemInvalidPrice => "Invalid menu item price",
            ErrorCode::StoryCategoryNotFound => "Story category not found",
            ErrorCode::StoryNotFound => "Story not found",
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// A `u16` that names no [`ErrorCode`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            2 => ErrorCode::ValidationFailed,
            3 => ErrorCode::NotFound,
            4 => ErrorCode::AlreadyExists,
            1001 => ErrorCode::PositionOutOfRange,
            1002 => ErrorCode::OrderingConflict,
            1003 => ErrorCode::ScopeMismatch,
            2001 => ErrorCode::PrimaryCategoryNotFound,
            2002 => ErrorCode::PrimaryCategoryHasCategories,
            2101 => ErrorCode::MenuCategoryNotFound,
            2102 => ErrorCode::MenuCategoryHasItems,
            2201 => ErrorCode::MenuItemNotFound,
            2202 => ErrorCode::MenuItemInvalidPrice,
            3001 => ErrorCode::StoryCategoryNotFound,
            3101 => ErrorCode::StoryNotFound,
            9002 => ErrorCode::DatabaseError,
            _ => return Err(InvalidErrorCode(value)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
