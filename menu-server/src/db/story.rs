//! Story records: story categories and stories

use shared::models::{
    Story, StoryCategory, StoryCategoryCreate, StoryCategoryUpdate, StoryCreate, StoryUpdate,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::ordering::{RepoResult, ScopeKey};

// ── Story categories ──

const STORY_CATEGORY_COLUMNS: &str =
    "id, name, description, is_active, sort_order, created_at, updated_at";

pub async fn list_story_categories(pool: &PgPool) -> RepoResult<Vec<StoryCategory>> {
    let sql = format!(
        "SELECT {STORY_CATEGORY_COLUMNS} FROM story_categories ORDER BY sort_order, created_at, id"
    );
    Ok(sqlx::query_as(&sql).fetch_all(pool).await?)
}

pub async fn get_story_category(pool: &PgPool, id: i64) -> RepoResult<Option<StoryCategory>> {
    let sql = format!("SELECT {STORY_CATEGORY_COLUMNS} FROM story_categories WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn insert_story_category(
    conn: &mut PgConnection,
    data: &StoryCategoryCreate,
    sort_order: i32,
) -> RepoResult<StoryCategory> {
    let now = now_millis();
    let sql = format!(
        r#"
        INSERT INTO story_categories (id, name, description, is_active, sort_order, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING {STORY_CATEGORY_COLUMNS}
        "#
    );
    Ok(sqlx::query_as(&sql)
        .bind(snowflake_id())
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.is_active.unwrap_or(true))
        .bind(sort_order)
        .bind(now)
        .fetch_one(conn)
        .await?)
}

pub async fn update_story_category(
    pool: &PgPool,
    id: i64,
    data: &StoryCategoryUpdate,
) -> RepoResult<Option<StoryCategory>> {
    let sql = format!(
        r#"
        UPDATE story_categories SET
            name = COALESCE($1, name),
            description = COALESCE($2, description),
            is_active = COALESCE($3, is_active),
            updated_at = $4
        WHERE id = $5
        RETURNING {STORY_CATEGORY_COLUMNS}
        "#
    );
    Ok(sqlx::query_as(&sql)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.is_active)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn toggle_story_category(pool: &PgPool, id: i64) -> RepoResult<Option<StoryCategory>> {
    let sql = format!(
        "UPDATE story_categories SET is_active = NOT is_active, updated_at = $1 \
         WHERE id = $2 RETURNING {STORY_CATEGORY_COLUMNS}"
    );
    Ok(sqlx::query_as(&sql)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

// ── Stories ──

const STORY_COLUMNS: &str = "id, category_id, image_urls, is_active, sort_order, created_at, updated_at";

pub async fn list_all_stories(pool: &PgPool) -> RepoResult<Vec<Story>> {
    let sql = format!(
        "SELECT {STORY_COLUMNS} FROM stories ORDER BY category_id, sort_order, created_at, id"
    );
    Ok(sqlx::query_as(&sql).fetch_all(pool).await?)
}

pub async fn list_stories(pool: &PgPool, category_id: i64) -> RepoResult<Vec<Story>> {
    let sql = format!(
        "SELECT {STORY_COLUMNS} FROM stories WHERE category_id = $1 \
         ORDER BY sort_order, created_at, id"
    );
    Ok(sqlx::query_as(&sql).bind(category_id).fetch_all(pool).await?)
}

pub async fn get_story(pool: &PgPool, id: i64) -> RepoResult<Option<Story>> {
    let sql = format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = $1");
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(pool).await?)
}

pub async fn insert_story(
    conn: &mut PgConnection,
    data: &StoryCreate,
    sort_order: i32,
) -> RepoResult<Story> {
    let now = now_millis();
    let sql = format!(
        r#"
        INSERT INTO stories (id, category_id, image_urls, is_active, sort_order, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $6)
        RETURNING {STORY_COLUMNS}
        "#
    );
    sqlx::query_as(&sql)
        .bind(snowflake_id())
        .bind(data.category_id)
        .bind(&data.image_urls)
        .bind(data.is_active.unwrap_or(true))
        .bind(sort_order)
        .bind(now)
        .fetch_one(conn)
        .await
        .map_err(|e| super::missing_parent(e, ScopeKey::stories(data.category_id)))
}

/// Update attributes; the category is changed through the reorder engine
pub async fn update_story<'e>(
    executor: impl PgExecutor<'e>,
    id: i64,
    data: &StoryUpdate,
) -> RepoResult<Option<Story>> {
    let sql = format!(
        r#"
        UPDATE stories SET
            image_urls = COALESCE($1, image_urls),
            is_active = COALESCE($2, is_active),
            updated_at = $3
        WHERE id = $4
        RETURNING {STORY_COLUMNS}
        "#
    );
    Ok(sqlx::query_as(&sql)
        .bind(&data.image_urls)
        .bind(data.is_active)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

pub async fn toggle_story(pool: &PgPool, id: i64) -> RepoResult<Option<Story>> {
    let sql = format!(
        "UPDATE stories SET is_active = NOT is_active, updated_at = $1 \
         WHERE id = $2 RETURNING {STORY_COLUMNS}"
    );
    Ok(sqlx::query_as(&sql)
        .bind(now_millis())
        .bind(id)
        .fetch_optional(pool)
        .await?)
}
