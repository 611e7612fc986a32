//! Menu API: primary categories, menu categories, menu items
//!
//! Listing a single scope normalizes it first, so corrupted positions heal
//! on read. Move and reorder respond with the updated record.

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use futures::FutureExt;
use serde::Deserialize;
use shared::models::{
    MenuCategory, MenuCategoryCreate, MenuCategoryUpdate, MenuItem, MenuItemCreate,
    MenuItemUpdate, PrimaryCategory, PrimaryCategoryCreate, PrimaryCategoryUpdate,
};
use shared::request::{MoveOrderRequest, ReorderRequest};

use super::ApiResult;
use crate::db::menu;
use crate::error::not_found;
use crate::ordering::{EntityKind, MemberRef, ScopeKey};
use crate::state::AppState;
use crate::validation;

pub fn router() -> Router<AppState> {
    Router::new()
        // primary categories
        .route(
            "/api/menu/primary-categories",
            get(list_primary_categories).post(create_primary_category),
        )
        .route(
            "/api/menu/primary-categories/reorder",
            patch(reorder_primary_category),
        )
        .route(
            "/api/menu/primary-categories/{id}",
            get(get_primary_category)
                .patch(update_primary_category)
                .delete(delete_primary_category),
        )
        .route(
            "/api/menu/primary-categories/{id}/move",
            patch(move_primary_category),
        )
        // menu categories
        .route(
            "/api/menu/categories",
            get(list_menu_categories).post(create_menu_category),
        )
        .route("/api/menu/categories/reorder", patch(reorder_menu_category))
        .route(
            "/api/menu/categories/{id}",
            get(get_menu_category)
                .patch(update_menu_category)
                .delete(delete_menu_category),
        )
        .route("/api/menu/categories/{id}/move", patch(move_menu_category))
        .route("/api/menu/categories/{id}/items", get(list_category_items))
        // menu items
        .route("/api/menu/items", get(list_menu_items).post(create_menu_item))
        .route("/api/menu/items/reorder", patch(reorder_menu_item))
        .route(
            "/api/menu/items/{id}",
            get(get_menu_item)
                .patch(update_menu_item)
                .delete(delete_menu_item),
        )
        .route("/api/menu/items/{id}/move", patch(move_menu_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryFilter {
    pub primary_category_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    pub category_id: Option<i64>,
}

fn deleted(id: i64) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "id": id, "deleted": true }))
}

// ── Primary categories ──

/// GET /api/menu/primary-categories
pub async fn list_primary_categories(
    State(state): State<AppState>,
) -> ApiResult<Vec<PrimaryCategory>> {
    state.engine.normalize(ScopeKey::primary_categories()).await?;
    Ok(Json(menu::list_primary_categories(&state.pool).await?))
}

/// POST /api/menu/primary-categories
pub async fn create_primary_category(
    State(state): State<AppState>,
    Json(data): Json<PrimaryCategoryCreate>,
) -> ApiResult<PrimaryCategory> {
    validation::primary_category_create(&data)?;
    let category = state
        .engine
        .admit(ScopeKey::primary_categories(), move |tx, position| {
            async move { menu::insert_primary_category(tx.conn(), &data, position).await }.boxed()
        })
        .await?;
    tracing::info!(id = category.id, name = %category.name, "Primary category created");
    Ok(Json(category))
}

/// GET /api/menu/primary-categories/{id}
pub async fn get_primary_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<PrimaryCategory> {
    let category = menu::get_primary_category(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(EntityKind::PrimaryCategory, id))?;
    Ok(Json(category))
}

/// PATCH /api/menu/primary-categories/{id}
pub async fn update_primary_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<PrimaryCategoryUpdate>,
) -> ApiResult<PrimaryCategory> {
    validation::primary_category_update(&data)?;
    let category = menu::update_primary_category(&state.pool, id, &data)
        .await?
        .ok_or_else(|| not_found(EntityKind::PrimaryCategory, id))?;
    Ok(Json(category))
}

/// DELETE /api/menu/primary-categories/{id}
pub async fn delete_primary_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    state
        .engine
        .remove(MemberRef::new(EntityKind::PrimaryCategory, id))
        .await?;
    Ok(deleted(id))
}

/// PATCH /api/menu/primary-categories/{id}/move
pub async fn move_primary_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveOrderRequest>,
) -> ApiResult<PrimaryCategory> {
    state
        .engine
        .move_adjacent(MemberRef::new(EntityKind::PrimaryCategory, id), req.direction)
        .await?;
    get_primary_category(State(state), Path(id)).await
}

/// PATCH /api/menu/primary-categories/reorder
pub async fn reorder_primary_category(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<PrimaryCategory> {
    state
        .engine
        .reorder_explicit(
            MemberRef::new(EntityKind::PrimaryCategory, req.member_id),
            req.new_order,
        )
        .await?;
    get_primary_category(State(state), Path(req.member_id)).await
}

// ── Menu categories ──

/// GET /api/menu/categories
///
/// With `primaryCategoryId` only that scope is returned (normalized);
/// without it every category is listed.
pub async fn list_menu_categories(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
) -> ApiResult<Vec<MenuCategory>> {
    let categories = match filter.primary_category_id {
        Some(primary_id) => {
            state
                .engine
                .normalize(ScopeKey::menu_categories(Some(primary_id)))
                .await?;
            menu::list_menu_categories(&state.pool, Some(primary_id)).await?
        }
        None => menu::list_all_menu_categories(&state.pool).await?,
    };
    Ok(Json(categories))
}

/// POST /api/menu/categories
pub async fn create_menu_category(
    State(state): State<AppState>,
    Json(data): Json<MenuCategoryCreate>,
) -> ApiResult<MenuCategory> {
    validation::menu_category_create(&data)?;
    let scope = ScopeKey::menu_categories(data.primary_category_id);
    let category = state
        .engine
        .admit(scope, move |tx, position| {
            async move { menu::insert_menu_category(tx.conn(), &data, position).await }.boxed()
        })
        .await?;
    tracing::info!(id = category.id, scope = %scope, "Menu category created");
    Ok(Json(category))
}

/// GET /api/menu/categories/{id}
pub async fn get_menu_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<MenuCategory> {
    let category = menu::get_menu_category(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(EntityKind::MenuCategory, id))?;
    Ok(Json(category))
}

/// PATCH /api/menu/categories/{id}
///
/// A present `primaryCategoryId` (including `null`) moves the category to
/// the end of that scope; the move and the attribute update commit together.
pub async fn update_menu_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<MenuCategoryUpdate>,
) -> ApiResult<MenuCategory> {
    validation::menu_category_update(&data)?;
    let member = MemberRef::new(EntityKind::MenuCategory, id);
    let reparent = data.primary_category_id;
    let category = match reparent {
        Some(primary_id) => {
            let scope = ScopeKey::menu_categories(primary_id);
            state
                .engine
                .change_scope_with(member, scope, None, move |tx, _| {
                    async move { menu::update_menu_category(tx.conn(), id, &data).await }.boxed()
                })
                .await?
        }
        None => menu::update_menu_category(&state.pool, id, &data).await?,
    }
    .ok_or_else(|| not_found(EntityKind::MenuCategory, id))?;
    Ok(Json(category))
}

/// DELETE /api/menu/categories/{id}
pub async fn delete_menu_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    state
        .engine
        .remove(MemberRef::new(EntityKind::MenuCategory, id))
        .await?;
    Ok(deleted(id))
}

/// PATCH /api/menu/categories/{id}/move
pub async fn move_menu_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveOrderRequest>,
) -> ApiResult<MenuCategory> {
    state
        .engine
        .move_adjacent(MemberRef::new(EntityKind::MenuCategory, id), req.direction)
        .await?;
    get_menu_category(State(state), Path(id)).await
}

/// PATCH /api/menu/categories/reorder
pub async fn reorder_menu_category(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<MenuCategory> {
    state
        .engine
        .reorder_explicit(
            MemberRef::new(EntityKind::MenuCategory, req.member_id),
            req.new_order,
        )
        .await?;
    get_menu_category(State(state), Path(req.member_id)).await
}

/// GET /api/menu/categories/{id}/items
pub async fn list_category_items(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Vec<MenuItem>> {
    menu::get_menu_category(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(EntityKind::MenuCategory, id))?;
    state.engine.normalize(ScopeKey::menu_items(id)).await?;
    Ok(Json(menu::list_menu_items(&state.pool, id).await?))
}

// ── Menu items ──

/// GET /api/menu/items
pub async fn list_menu_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> ApiResult<Vec<MenuItem>> {
    let items = match filter.category_id {
        Some(category_id) => {
            state
                .engine
                .normalize(ScopeKey::menu_items(category_id))
                .await?;
            menu::list_menu_items(&state.pool, category_id).await?
        }
        None => menu::list_all_menu_items(&state.pool).await?,
    };
    Ok(Json(items))
}

/// POST /api/menu/items
pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(data): Json<MenuItemCreate>,
) -> ApiResult<MenuItem> {
    validation::menu_item_create(&data)?;
    let scope = ScopeKey::menu_items(data.category_id);
    let item = state
        .engine
        .admit(scope, move |tx, position| {
            async move { menu::insert_menu_item(tx.conn(), &data, position).await }.boxed()
        })
        .await?;
    tracing::info!(id = item.id, scope = %scope, "Menu item created");
    Ok(Json(item))
}

/// GET /api/menu/items/{id}
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<MenuItem> {
    let item = menu::get_menu_item(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(EntityKind::MenuItem, id))?;
    Ok(Json(item))
}

/// PATCH /api/menu/items/{id}
///
/// A changed `categoryId` appends the item to the new category, in the same
/// transaction as the attribute update.
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<MenuItemUpdate>,
) -> ApiResult<MenuItem> {
    validation::menu_item_update(&data)?;
    let member = MemberRef::new(EntityKind::MenuItem, id);
    let reparent = data.category_id;
    let item = match reparent {
        Some(category_id) => {
            let scope = ScopeKey::menu_items(category_id);
            state
                .engine
                .change_scope_with(member, scope, None, move |tx, _| {
                    async move { menu::update_menu_item(tx.conn(), id, &data).await }.boxed()
                })
                .await?
        }
        None => menu::update_menu_item(&state.pool, id, &data).await?,
    }
    .ok_or_else(|| not_found(EntityKind::MenuItem, id))?;
    Ok(Json(item))
}

/// DELETE /api/menu/items/{id}
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    state
        .engine
        .remove(MemberRef::new(EntityKind::MenuItem, id))
        .await?;
    Ok(deleted(id))
}

/// PATCH /api/menu/items/{id}/move
pub async fn move_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveOrderRequest>,
) -> ApiResult<MenuItem> {
    state
        .engine
        .move_adjacent(MemberRef::new(EntityKind::MenuItem, id), req.direction)
        .await?;
    get_menu_item(State(state), Path(id)).await
}

/// PATCH /api/menu/items/reorder
pub async fn reorder_menu_item(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<MenuItem> {
    state
        .engine
        .reorder_explicit(MemberRef::new(EntityKind::MenuItem, req.member_id), req.new_order)
        .await?;
    get_menu_item(State(state), Path(req.member_id)).await
}
