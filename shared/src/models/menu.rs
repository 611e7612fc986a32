//! Menu Models
//!
//! Primary categories group menu categories, menu categories group menu items.
//! Every record carries a `sort_order`: its rank among siblings. The server owns
//! that field, so create/update payloads never carry it.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::util::double_option;

/// Primary category entity (top-level menu section)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct PrimaryCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create primary category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryCategoryCreate {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Update primary category payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryCategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

/// Menu category entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct MenuCategory {
    pub id: i64,
    /// Owning primary category; `None` places it in the ungrouped list
    pub primary_category_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create menu category payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategoryCreate {
    pub name: String,
    pub description: Option<String>,
    pub primary_category_id: Option<i64>,
    pub is_active: Option<bool>,
}

/// Update menu category payload
///
/// `primaryCategoryId` is tri-state: absent keeps the parent, `null` detaches
/// the category, a value moves it to the end of that primary category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuCategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub primary_category_id: Option<Option<i64>>,
    pub is_active: Option<bool>,
}

/// Menu item entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub category_id: i64,
    pub name: String,
    pub description: String,
    /// Absent when the item is priced per measurement
    pub price: Option<Decimal>,
    /// Minutes
    pub preparation_time: Option<i32>,
    pub allergens: Vec<String>,
    pub dietary_info: Vec<String>,
    pub is_available: bool,
    pub image_urls: Vec<String>,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create menu item payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemCreate {
    pub category_id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<Decimal>,
    pub preparation_time: Option<i32>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub dietary_info: Vec<String>,
    pub is_available: Option<bool>,
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Update menu item payload
///
/// A changed `categoryId` moves the item to the end of the new category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    pub category_id: Option<i64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub preparation_time: Option<i32>,
    pub allergens: Option<Vec<String>>,
    pub dietary_info: Option<Vec<String>>,
    pub is_available: Option<bool>,
    pub image_urls: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_item_create_defaults() {
        let json = r#"{"categoryId": 7, "name": "Soup"}"#;
        let data: MenuItemCreate = serde_json::from_str(json).unwrap();
        assert_eq!(data.category_id, 7);
        assert_eq!(data.description, "");
        assert!(data.price.is_none());
        assert!(data.allergens.is_empty());
        assert!(data.image_urls.is_empty());
    }

    #[test]
    fn test_menu_category_update_parent_tri_state() {
        let absent: MenuCategoryUpdate = serde_json::from_str(r#"{"name": "Mains"}"#).unwrap();
        assert_eq!(absent.primary_category_id, None);

        let detach: MenuCategoryUpdate =
            serde_json::from_str(r#"{"primaryCategoryId": null}"#).unwrap();
        assert_eq!(detach.primary_category_id, Some(None));

        let reparent: MenuCategoryUpdate =
            serde_json::from_str(r#"{"primaryCategoryId": 12}"#).unwrap();
        assert_eq!(reparent.primary_category_id, Some(Some(12)));
    }

    #[test]
    fn test_menu_item_serializes_camel_case() {
        let item = MenuItem {
            id: 1,
            category_id: 2,
            name: "Tea".to_string(),
            description: String::new(),
            price: Some(Decimal::new(350, 2)),
            preparation_time: None,
            allergens: vec![],
            dietary_info: vec!["vegan".to_string()],
            is_available: true,
            image_urls: vec![],
            sort_order: 3,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["categoryId"], 2);
        assert_eq!(json["sortOrder"], 3);
        assert_eq!(json["dietaryInfo"][0], "vegan");
    }
}
