//! Menu records: primary categories, menu categories, menu items
//!
//! Inserts take a connection because they run inside the reorder engine's
//! `admit` transaction. Updates of reparentable records take any executor so
//! a reparenting PATCH can run them inside `change_scope_with`. `sort_order`
//! is never written here.

use shared::models::{
    MenuCategory, MenuCategoryCreate, MenuCategoryUpdate, MenuItem, MenuItemCreate,
    MenuItemUpdate, PrimaryCategory, PrimaryCategoryCreate, PrimaryCategoryUpdate,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::ordering::{RepoResult, ScopeKey};

// ── Primary categories ──

const PRIMARY_CATEGORY_COLUMNS: &str =
    "id, name, description, image_url, sort_order, is_active, created_at, updated_at";

pub async fn list_primary_categories(pool: &PgPool) -> RepoResult<Vec<PrimaryCategory>> {
    let sql = format!(
        "SELECT {PRIMARY_CATEGORY_COLUMNS} FROM primary_categories ORDER BY sort_order, created_at, id"
    );
    Ok(sqlx::query_as(&sql).fetch_all(pool).await?)
}

pub async fn get_primary_category(pool: &PgPool, id: i64) -> RepoResult<Option<PrimaryCategory>> {
    let sql = format!("SELECT {PRIMARY_CATEGORY_COLUMNS} FROM primary_categories WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn insert_primary_category(
    conn: &mut PgConnection,
    data: &PrimaryCategoryCreate,
    sort_order: i32,
) -> RepoResult<PrimaryCategory> {
    let now = now_millis();
    let sql = format!(
        r#"
        INSERT INTO primary_categories (id, name, description, image_url, sort_order, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING {PRIMARY_CATEGORY_COLUMNS}
        "#
    );
    Ok(sqlx::query_as(&sql)
        .bind(snowflake_id())
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(sort_order)
        .bind(data.is_active.unwrap_or(true))
        .bind(now)
        .fetch_one(conn)
        .await?)
}

pub async fn update_primary_category(
    pool: &PgPool,
    id: i64,
    data: &PrimaryCategoryUpdate,
) -> RepoResult<Option<PrimaryCategory>> {
    let sql = format!(
        r#"
        UPDATE primary_categories SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            image_url = COALESCE($3, image_url),
            is_active = COALESCE($4, is_active),
            updated_at = $5
        WHERE id = $6
        RETURNING {PRIMARY_CATEGORY_COLUMNS}
        "#
    );
    Ok(sqlx::query_as(&sql)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.image_url)
        .bind(data.is_active)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

// ── Menu categories ──

const MENU_CATEGORY_COLUMNS: &str =
    "id, primary_category_id, name, description, sort_order, is_active, created_at, updated_at";

/// Every menu category, ungrouped ones first, then by primary category
pub async fn list_all_menu_categories(pool: &PgPool) -> RepoResult<Vec<MenuCategory>> {
    let sql = format!(
        "SELECT {MENU_CATEGORY_COLUMNS} FROM menu_categories \
         ORDER BY primary_category_id NULLS FIRST, sort_order, created_at, id"
    );
    Ok(sqlx::query_as(&sql).fetch_all(pool).await?)
}

pub async fn list_menu_categories(
    pool: &PgPool,
    primary_category_id: Option<i64>,
) -> RepoResult<Vec<MenuCategory>> {
    let sql = format!(
        "SELECT {MENU_CATEGORY_COLUMNS} FROM menu_categories \
         WHERE primary_category_id IS NOT DISTINCT FROM $1 \
         ORDER BY sort_order, created_at, id"
    );
    Ok(sqlx::query_as(&sql)
        .bind(primary_category_id)
        .fetch_all(pool)
        .await?)
}

pub async fn get_menu_category(pool: &PgPool, id: i64) -> RepoResult<Option<MenuCategory>> {
    let sql = format!("SELECT {MENU_CATEGORY_COLUMNS} FROM menu_categories WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn insert_menu_category(
    conn: &mut PgConnection,
    data: &MenuCategoryCreate,
    sort_order: i32,
) -> RepoResult<MenuCategory> {
    let now = now_millis();
    let sql = format!(
        r#"
        INSERT INTO menu_categories (id, primary_category_id, name, description, sort_order, is_active, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
        RETURNING {MENU_CATEGORY_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(snowflake_id())
        .bind(data.primary_category_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(sort_order)
        .bind(data.is_active.unwrap_or(true))
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(|e| super::missing_parent(e, ScopeKey::menu_categories(data.primary_category_id)))
}

/// Update attributes; the parent is changed through the reorder engine
pub async fn update_menu_category<'e>(
    executor: impl PgExecutor<'e>,
    id: i64,
    data: &MenuCategoryUpdate,
) -> RepoResult<Option<MenuCategory>> {
    let sql = format!(
        r#"
        UPDATE menu_categories SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            is_active = COALESCE($3, is_active),
            updated_at = $4
        WHERE id = $5
        RETURNING {MENU_CATEGORY_COLUMNS}
        "#
    );
    Ok(sqlx::query_as(&sql)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.is_active)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

// ── Menu items ──

const MENU_ITEM_COLUMNS: &str = "id, category_id, name, description, price, preparation_time, \
     allergens, dietary_info, is_available, image_urls, sort_order, created_at, updated_at";

pub async fn list_all_menu_items(pool: &PgPool) -> RepoResult<Vec<MenuItem>> {
    let sql = format!(
        "SELECT {MENU_ITEM_COLUMNS} FROM menu_items ORDER BY category_id, sort_order, created_at, id"
    );
    Ok(sqlx::query_as(&sql).fetch_all(pool).await?)
}

pub async fn list_menu_items(pool: &PgPool, category_id: i64) -> RepoResult<Vec<MenuItem>> {
    let sql = format!(
        "SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE category_id = $1 \
         ORDER BY sort_order, created_at, id"
    );
    Ok(sqlx::query_as(&sql).bind(category_id).fetch_all(pool).await?)
}

pub async fn get_menu_item(pool: &PgPool, id: i64) -> RepoResult<Option<MenuItem>> {
    let sql = format!("SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn insert_menu_item(
    conn: &mut PgConnection,
    data: &MenuItemCreate,
    sort_order: i32,
) -> RepoResult<MenuItem> {
    let now = now_millis();
    let sql = format!(
        r#"
        INSERT INTO menu_items (
            id, category_id, name, description, price, preparation_time,
            allergens, dietary_info, is_available, image_urls, sort_order,
            created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12)
        RETURNING {MENU_ITEM_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(snowflake_id())
        .bind(data.category_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.preparation_time)
        .bind(&data.allergens)
        .bind(&data.dietary_info)
        .bind(data.is_available.unwrap_or(true))
        .bind(&data.image_urls)
        .bind(sort_order)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(|e| super::missing_parent(e, ScopeKey::menu_items(data.category_id)))
}

/// Update attributes; the category is changed through the reorder engine
pub async fn update_menu_item<'e>(
    executor: impl PgExecutor<'e>,
    id: i64,
    data: &MenuItemUpdate,
) -> RepoResult<Option<MenuItem>> {
    let sql = format!(
        r#"
        UPDATE menu_items SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            price = COALESCE($3, price),
            preparation_time = COALESCE($4, preparation_time),
            allergens = COALESCE($5, allergens),
            dietary_info = COALESCE($6, dietary_info),
            is_available = COALESCE($7, is_available),
            image_urls = COALESCE($8, image_urls),
            updated_at = $9
        WHERE id = $10
        RETURNING {MENU_ITEM_COLUMNS}
        "#
    );
    Ok(sqlx::query_as(&sql)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.price)
        .bind(data.preparation_time)
        .bind(&data.allergens)
        .bind(&data.dietary_info)
        .bind(data.is_available)
        .bind(&data.image_urls)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(executor)
        .await?)
}
