//! Story API: story categories and stories

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::{get, patch};
use futures::FutureExt;
use serde::Deserialize;
use shared::models::{
    Story, StoryCategory, StoryCategoryCreate, StoryCategoryUpdate, StoryCreate, StoryUpdate,
};
use shared::request::{MoveOrderRequest, ReorderRequest};

use super::ApiResult;
use crate::db::story;
use crate::error::not_found;
use crate::ordering::{EntityKind, MemberRef, ScopeKey};
use crate::state::AppState;
use crate::validation;

pub fn router() -> Router<AppState> {
    Router::new()
        // story categories
        .route(
            "/api/stories/categories",
            get(list_story_categories).post(create_story_category),
        )
        .route("/api/stories/categories/reorder", patch(reorder_story_category))
        .route(
            "/api/stories/categories/{id}",
            get(get_story_category)
                .patch(update_story_category)
                .delete(delete_story_category),
        )
        .route("/api/stories/categories/{id}/move", patch(move_story_category))
        .route("/api/stories/categories/{id}/toggle", patch(toggle_story_category))
        // stories
        .route("/api/stories", get(list_stories).post(create_story))
        .route("/api/stories/reorder", patch(reorder_story))
        .route(
            "/api/stories/{id}",
            get(get_story).patch(update_story).delete(delete_story),
        )
        .route("/api/stories/{id}/move", patch(move_story))
        .route("/api/stories/{id}/toggle", patch(toggle_story))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryFilter {
    pub category_id: Option<i64>,
}

// ── Story categories ──

/// GET /api/stories/categories
pub async fn list_story_categories(State(state): State<AppState>) -> ApiResult<Vec<StoryCategory>> {
    state.engine.normalize(ScopeKey::story_categories()).await?;
    Ok(Json(story::list_story_categories(&state.pool).await?))
}

/// POST /api/stories/categories
pub async fn create_story_category(
    State(state): State<AppState>,
    Json(data): Json<StoryCategoryCreate>,
) -> ApiResult<StoryCategory> {
    validation::story_category_create(&data)?;
    let category = state
        .engine
        .admit(ScopeKey::story_categories(), move |tx, position| {
            async move { story::insert_story_category(tx.conn(), &data, position).await }.boxed()
        })
        .await?;
    tracing::info!(id = category.id, name = %category.name, "Story category created");
    Ok(Json(category))
}

/// GET /api/stories/categories/{id}
pub async fn get_story_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StoryCategory> {
    let category = story::get_story_category(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(EntityKind::StoryCategory, id))?;
    Ok(Json(category))
}

/// PATCH /api/stories/categories/{id}
pub async fn update_story_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<StoryCategoryUpdate>,
) -> ApiResult<StoryCategory> {
    validation::story_category_update(&data)?;
    let category = story::update_story_category(&state.pool, id, &data)
        .await?
        .ok_or_else(|| not_found(EntityKind::StoryCategory, id))?;
    Ok(Json(category))
}

/// DELETE /api/stories/categories/{id}
///
/// Stories of the category are deleted with it.
pub async fn delete_story_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    state
        .engine
        .remove(MemberRef::new(EntityKind::StoryCategory, id))
        .await?;
    Ok(Json(serde_json::json!({ "id": id, "deleted": true })))
}

/// PATCH /api/stories/categories/{id}/move
pub async fn move_story_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveOrderRequest>,
) -> ApiResult<StoryCategory> {
    state
        .engine
        .move_adjacent(MemberRef::new(EntityKind::StoryCategory, id), req.direction)
        .await?;
    get_story_category(State(state), Path(id)).await
}

/// PATCH /api/stories/categories/{id}/toggle
pub async fn toggle_story_category(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StoryCategory> {
    let category = story::toggle_story_category(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(EntityKind::StoryCategory, id))?;
    Ok(Json(category))
}

/// PATCH /api/stories/categories/reorder
pub async fn reorder_story_category(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<StoryCategory> {
    state
        .engine
        .reorder_explicit(
            MemberRef::new(EntityKind::StoryCategory, req.member_id),
            req.new_order,
        )
        .await?;
    get_story_category(State(state), Path(req.member_id)).await
}

// ── Stories ──

/// GET /api/stories
pub async fn list_stories(
    State(state): State<AppState>,
    Query(filter): Query<StoryFilter>,
) -> ApiResult<Vec<Story>> {
    let stories = match filter.category_id {
        Some(category_id) => {
            state
                .engine
                .normalize(ScopeKey::stories(category_id))
                .await?;
            story::list_stories(&state.pool, category_id).await?
        }
        None => story::list_all_stories(&state.pool).await?,
    };
    Ok(Json(stories))
}

/// POST /api/stories
pub async fn create_story(
    State(state): State<AppState>,
    Json(data): Json<StoryCreate>,
) -> ApiResult<Story> {
    validation::story_create(&data)?;
    let scope = ScopeKey::stories(data.category_id);
    let created = state
        .engine
        .admit(scope, move |tx, position| {
            async move { story::insert_story(tx.conn(), &data, position).await }.boxed()
        })
        .await?;
    tracing::info!(id = created.id, scope = %scope, "Story created");
    Ok(Json(created))
}

/// GET /api/stories/{id}
pub async fn get_story(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Story> {
    let found = story::get_story(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(EntityKind::Story, id))?;
    Ok(Json(found))
}

/// PATCH /api/stories/{id}
///
/// A changed `categoryId` appends the story to the new category, in the same
/// transaction as the attribute update.
pub async fn update_story(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(data): Json<StoryUpdate>,
) -> ApiResult<Story> {
    validation::story_update(&data)?;
    let member = MemberRef::new(EntityKind::Story, id);
    let reparent = data.category_id;
    let updated = match reparent {
        Some(category_id) => {
            let scope = ScopeKey::stories(category_id);
            state
                .engine
                .change_scope_with(member, scope, None, move |tx, _| {
                    async move { story::update_story(tx.conn(), id, &data).await }.boxed()
                })
                .await?
        }
        None => story::update_story(&state.pool, id, &data).await?,
    }
    .ok_or_else(|| not_found(EntityKind::Story, id))?;
    Ok(Json(updated))
}

/// DELETE /api/stories/{id}
pub async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<serde_json::Value> {
    state
        .engine
        .remove(MemberRef::new(EntityKind::Story, id))
        .await?;
    Ok(Json(serde_json::json!({ "id": id, "deleted": true })))
}

/// PATCH /api/stories/{id}/move
pub async fn move_story(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<MoveOrderRequest>,
) -> ApiResult<Story> {
    state
        .engine
        .move_adjacent(MemberRef::new(EntityKind::Story, id), req.direction)
        .await?;
    get_story(State(state), Path(id)).await
}

/// PATCH /api/stories/{id}/toggle
pub async fn toggle_story(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Story> {
    let toggled = story::toggle_story(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(EntityKind::Story, id))?;
    Ok(Json(toggled))
}

/// PATCH /api/stories/reorder
pub async fn reorder_story(
    State(state): State<AppState>,
    Json(req): Json<ReorderRequest>,
) -> ApiResult<Story> {
    state
        .engine
        .reorder_explicit(MemberRef::new(EntityKind::Story, req.member_id), req.new_order)
        .await?;
    get_story(State(state), Path(req.member_id)).await
}
