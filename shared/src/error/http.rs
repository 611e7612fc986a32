//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::NotFound
            | Self::PrimaryCategoryNotFound
            | Self::MenuCategoryNotFound
            | Self::MenuItemNotFound
            | Self::StoryCategoryNotFound
            | Self::StoryNotFound => StatusCode::NOT_FOUND,

            Self::AlreadyExists
            | Self::OrderingConflict
            | Self::PrimaryCategoryHasCategories
            | Self::MenuCategoryHasItems => StatusCode::CONFLICT,

            Self::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,

            Self::ValidationFailed
            | Self::PositionOutOfRange
            | Self::ScopeMismatch
            | Self::MenuItemInvalidPrice => StatusCode::BAD_REQUEST,
        }
    }
}
