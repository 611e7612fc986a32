//! Story Models

use serde::{Deserialize, Serialize};

/// Story category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StoryCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create story category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCategoryCreate {
    pub name: String,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Update story category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Story entity (an image set shown inside a story category)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: i64,
    pub category_id: i64,
    pub image_urls: Vec<String>,
    pub is_active: bool,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create story payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCreate {
    pub category_id: i64,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub is_active: Option<bool>,
}

/// Update story payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryUpdate {
    pub category_id: Option<i64>,
    pub image_urls: Option<Vec<String>>,
    pub is_active: Option<bool>,
}
