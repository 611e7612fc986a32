//! PostgreSQL sibling store
//!
//! Scope serialization uses transaction-scoped advisory locks keyed by the
//! scope's display form, so two server instances never interleave writes to
//! the same sibling list. Rows are additionally locked `FOR UPDATE` on load.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};

use crate::ordering::{
    EntityKind, MemberRef, PositionChange, RepoError, RepoResult, ScopeKey, Sibling,
    SiblingStore, SiblingTx,
};

/// Column that groups siblings, `None` for ungrouped kinds
fn parent_column(kind: EntityKind) -> Option<&'static str> {
    match kind {
        EntityKind::PrimaryCategory | EntityKind::StoryCategory => None,
        EntityKind::MenuCategory => Some("primary_category_id"),
        EntityKind::MenuItem | EntityKind::Story => Some("category_id"),
    }
}

async fn scope_of(conn: &mut PgConnection, member: MemberRef) -> RepoResult<Option<ScopeKey>> {
    let table = member.kind.table();
    let Some(column) = parent_column(member.kind) else {
        let sql = format!("SELECT id FROM {table} WHERE id = $1");
        let row: Option<(i64,)> = sqlx::query_as(&sql)
            .bind(member.id)
            .fetch_optional(conn)
            .await?;
        return Ok(row.and_then(|_| ScopeKey::new(member.kind, None)));
    };

    let sql = format!("SELECT {column} FROM {table} WHERE id = $1");
    let row: Option<(Option<i64>,)> = sqlx::query_as(&sql)
        .bind(member.id)
        .fetch_optional(conn)
        .await?;
    Ok(row.and_then(|(parent,)| ScopeKey::new(member.kind, parent)))
}

#[derive(Debug, Clone)]
pub struct PgSiblingStore {
    pool: PgPool,
}

impl PgSiblingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SiblingStore for PgSiblingStore {
    type Tx = PgSiblingTx;

    async fn scope_of(&self, member: MemberRef) -> RepoResult<Option<ScopeKey>> {
        let mut conn = self.pool.acquire().await?;
        scope_of(&mut conn, member).await
    }

    async fn begin(&self) -> RepoResult<PgSiblingTx> {
        Ok(PgSiblingTx {
            tx: self.pool.begin().await?,
        })
    }
}

pub struct PgSiblingTx {
    tx: Transaction<'static, Postgres>,
}

impl PgSiblingTx {
    /// The underlying connection, for record writes inside `admit`
    pub fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

#[async_trait]
impl SiblingTx for PgSiblingTx {
    async fn lock_scope(&mut self, scope: ScopeKey) -> RepoResult<()> {
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
            .bind(scope.to_string())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn scope_of(&mut self, member: MemberRef) -> RepoResult<Option<ScopeKey>> {
        scope_of(&mut self.tx, member).await
    }

    async fn load(&mut self, scope: ScopeKey) -> RepoResult<Vec<Sibling>> {
        let table = scope.kind().table();
        let rows: Vec<(i64, i32, i64)> = match parent_column(scope.kind()) {
            Some(column) => {
                let sql = format!(
                    "SELECT id, sort_order, created_at FROM {table} \
                     WHERE {column} IS NOT DISTINCT FROM $1 \
                     ORDER BY sort_order, created_at, id FOR UPDATE"
                );
                sqlx::query_as(&sql)
                    .bind(scope.parent())
                    .fetch_all(&mut *self.tx)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT id, sort_order, created_at FROM {table} \
                     ORDER BY sort_order, created_at, id FOR UPDATE"
                );
                sqlx::query_as(&sql).fetch_all(&mut *self.tx).await?
            }
        };

        Ok(rows
            .into_iter()
            .map(|(id, position, created_at)| Sibling {
                id,
                position,
                created_at,
            })
            .collect())
    }

    async fn write_positions(
        &mut self,
        kind: EntityKind,
        changes: &[PositionChange],
    ) -> RepoResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let now = shared::util::now_millis();
        let ids: Vec<i64> = changes.iter().map(|c| c.id).collect();
        let orders: Vec<i32> = changes.iter().map(|c| c.to).collect();

        let table = kind.table();
        let sql = format!(
            "UPDATE {table} SET sort_order = u.sort_order, updated_at = $3 \
             FROM (SELECT * FROM UNNEST($1::bigint[], $2::integer[])) AS u(id, sort_order) \
             WHERE {table}.id = u.id"
        );
        let result = sqlx::query(&sql)
            .bind(&ids)
            .bind(&orders)
            .bind(now)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() != changes.len() as u64 {
            return Err(RepoError::Conflict(format!(
                "expected {} {table} rows, updated {}",
                changes.len(),
                result.rows_affected()
            )));
        }
        Ok(())
    }

    async fn delete(&mut self, member: MemberRef) -> RepoResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = $1", member.kind.table());
        let result = sqlx::query(&sql)
            .bind(member.id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                if super::is_foreign_key_violation(&e) {
                    RepoError::in_use(member)
                } else {
                    e.into()
                }
            })?;

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found(member));
        }
        Ok(())
    }

    async fn rescope(&mut self, member: MemberRef, to: ScopeKey, position: i32) -> RepoResult<()> {
        let now = shared::util::now_millis();
        let table = member.kind.table();
        let result = match parent_column(member.kind) {
            Some(column) => {
                let sql = format!(
                    "UPDATE {table} SET {column} = $1, sort_order = $2, updated_at = $3 WHERE id = $4"
                );
                sqlx::query(&sql)
                    .bind(to.parent())
                    .bind(position)
                    .bind(now)
                    .bind(member.id)
                    .execute(&mut *self.tx)
                    .await
                    .map_err(|e| super::missing_parent(e, to))?
            }
            None => {
                let sql = format!("UPDATE {table} SET sort_order = $1, updated_at = $2 WHERE id = $3");
                sqlx::query(&sql)
                    .bind(position)
                    .bind(now)
                    .bind(member.id)
                    .execute(&mut *self.tx)
                    .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(RepoError::not_found(member));
        }
        Ok(())
    }

    async fn commit(self) -> RepoResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
