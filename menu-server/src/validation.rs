//! Input validation helpers
//!
//! Centralized length limits and checks for create/update payloads.
//! PostgreSQL TEXT has no length enforcement of its own.

use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    MenuCategoryCreate, MenuCategoryUpdate, MenuItemCreate, MenuItemUpdate, PrimaryCategoryCreate,
    PrimaryCategoryUpdate, StoryCategoryCreate, StoryCategoryUpdate, StoryCreate, StoryUpdate,
};

// ── Limits ──────────────────────────────────────────────────────────

/// Category and item names
pub const MAX_NAME_LEN: usize = 200;

/// Descriptions
pub const MAX_NOTE_LEN: usize = 2000;

/// URLs / image paths
pub const MAX_URL_LEN: usize = 2048;

/// Images attached to one item or story
pub const MAX_IMAGES: usize = 5;

/// Allergen and dietary tags
pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LEN: usize = 50;

/// Largest value NUMERIC(8,2) can hold
const MAX_PRICE_UNITS: i64 = 999_999;

// ── Field helpers ───────────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")).with_detail("field", field));
    }
    validate_text_len(value, field, max_len)
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    match value {
        Some(v) => validate_text_len(v, field, max_len),
        None => Ok(()),
    }
}

/// Validate length only; empty is allowed.
pub fn validate_text_len(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        ))
        .with_detail("field", field));
    }
    Ok(())
}

pub fn validate_image_urls(urls: &[String], field: &str) -> Result<(), AppError> {
    if urls.len() > MAX_IMAGES {
        return Err(AppError::validation(format!(
            "{field} has {} entries, max {MAX_IMAGES}",
            urls.len()
        ))
        .with_detail("field", field));
    }
    for url in urls {
        validate_required_text(url, field, MAX_URL_LEN)?;
    }
    Ok(())
}

pub fn validate_tags(tags: &[String], field: &str) -> Result<(), AppError> {
    if tags.len() > MAX_TAGS {
        return Err(AppError::validation(format!(
            "{field} has {} entries, max {MAX_TAGS}",
            tags.len()
        ))
        .with_detail("field", field));
    }
    for tag in tags {
        validate_required_text(tag, field, MAX_TAG_LEN)?;
    }
    Ok(())
}

/// Non-negative, at most two decimal places, fits NUMERIC(8,2)
pub fn validate_price(price: Option<Decimal>) -> Result<(), AppError> {
    let Some(price) = price else {
        return Ok(());
    };
    if price.is_sign_negative() || price.scale() > 2 || price > Decimal::from(MAX_PRICE_UNITS) {
        return Err(AppError::with_message(
            ErrorCode::MenuItemInvalidPrice,
            format!("price {price} must be between 0 and {MAX_PRICE_UNITS} with at most 2 decimals"),
        )
        .with_detail("field", "price"));
    }
    Ok(())
}

pub fn validate_non_negative(value: Option<i32>, field: &str) -> Result<(), AppError> {
    match value {
        Some(v) if v < 0 => Err(AppError::validation(format!("{field} must not be negative"))
            .with_detail("field", field)),
        _ => Ok(()),
    }
}

// ── Payloads ────────────────────────────────────────────────────────

pub fn primary_category_create(data: &PrimaryCategoryCreate) -> Result<(), AppError> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.image_url, "imageUrl", MAX_URL_LEN)
}

pub fn primary_category_update(data: &PrimaryCategoryUpdate) -> Result<(), AppError> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_optional_text(&data.image_url, "imageUrl", MAX_URL_LEN)
}

pub fn menu_category_create(data: &MenuCategoryCreate) -> Result<(), AppError> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)
}

pub fn menu_category_update(data: &MenuCategoryUpdate) -> Result<(), AppError> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)
}

pub fn menu_item_create(data: &MenuItemCreate) -> Result<(), AppError> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_text_len(&data.description, "description", MAX_NOTE_LEN)?;
    validate_price(data.price)?;
    validate_non_negative(data.preparation_time, "preparationTime")?;
    validate_tags(&data.allergens, "allergens")?;
    validate_tags(&data.dietary_info, "dietaryInfo")?;
    validate_image_urls(&data.image_urls, "imageUrls")
}

pub fn menu_item_update(data: &MenuItemUpdate) -> Result<(), AppError> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)?;
    validate_price(data.price)?;
    validate_non_negative(data.preparation_time, "preparationTime")?;
    if let Some(allergens) = &data.allergens {
        validate_tags(allergens, "allergens")?;
    }
    if let Some(dietary_info) = &data.dietary_info {
        validate_tags(dietary_info, "dietaryInfo")?;
    }
    if let Some(urls) = &data.image_urls {
        validate_image_urls(urls, "imageUrls")?;
    }
    Ok(())
}

pub fn story_category_create(data: &StoryCategoryCreate) -> Result<(), AppError> {
    validate_required_text(&data.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)
}

pub fn story_category_update(data: &StoryCategoryUpdate) -> Result<(), AppError> {
    if let Some(name) = &data.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&data.description, "description", MAX_NOTE_LEN)
}

pub fn story_create(data: &StoryCreate) -> Result<(), AppError> {
    validate_image_urls(&data.image_urls, "imageUrls")
}

pub fn story_update(data: &StoryUpdate) -> Result<(), AppError> {
    if let Some(urls) = &data.image_urls {
        validate_image_urls(urls, "imageUrls")?;
    }
    Ok(())
}
