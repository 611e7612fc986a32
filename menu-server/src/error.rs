//! Service-layer error type
//!
//! `ServiceError` bridges infrastructure errors (`sqlx::Error`, `BoxError`)
//! and ordering failures to the API-layer error (`AppError`), so handlers can
//! use `?` everywhere.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::ordering::{EntityKind, OrderError, RepoError};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// - `Db`: database/infrastructure errors (logged, mapped to DatabaseError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Db(BoxError),
    App(AppError),
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        ServiceError::Db(e.into())
    }
}

impl From<BoxError> for ServiceError {
    fn from(e: BoxError) -> Self {
        ServiceError::Db(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<OrderError> for ServiceError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::Storage(msg) => ServiceError::Db(msg.into()),
            other => ServiceError::App(app_error(other)),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        OrderError::from(e).into()
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Db(db_err) => {
                tracing::error!(error = %db_err, "Service database error");
                AppError::new(ErrorCode::DatabaseError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Not-found code for a record kind
pub fn not_found_code(kind: EntityKind) -> ErrorCode {
    match kind {
        EntityKind::PrimaryCategory => ErrorCode::PrimaryCategoryNotFound,
        EntityKind::MenuCategory => ErrorCode::MenuCategoryNotFound,
        EntityKind::MenuItem => ErrorCode::MenuItemNotFound,
        EntityKind::StoryCategory => ErrorCode::StoryCategoryNotFound,
        EntityKind::Story => ErrorCode::StoryNotFound,
    }
}

/// 404 for a record that does not exist
pub fn not_found(kind: EntityKind, id: i64) -> AppError {
    AppError::with_message(not_found_code(kind), format!("{} {id} not found", kind.label()))
        .with_detail("id", id)
}

fn app_error(e: OrderError) -> AppError {
    let message = e.to_string();
    match e {
        OrderError::NotFound { kind, resource } => {
            let code = kind.map_or(ErrorCode::NotFound, not_found_code);
            AppError::with_message(code, message).with_detail("resource", resource)
        }
        OrderError::InvalidTarget(_) => AppError::with_message(ErrorCode::PositionOutOfRange, message),
        OrderError::ScopeMismatch { member, scope } => {
            AppError::with_message(ErrorCode::ScopeMismatch, message)
                .with_detail("member", member.to_string())
                .with_detail("scope", scope.to_string())
        }
        OrderError::Conflict(_) => AppError::conflict(message),
        OrderError::InUse { kind, .. } => {
            let code = match kind {
                EntityKind::PrimaryCategory => ErrorCode::PrimaryCategoryHasCategories,
                EntityKind::MenuCategory => ErrorCode::MenuCategoryHasItems,
                _ => ErrorCode::AlreadyExists,
            };
            AppError::with_message(code, message)
        }
        OrderError::Storage(_) => AppError::database(message),
    }
}
