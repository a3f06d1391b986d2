//! Group Repository Implementation
//!
//! PostgreSQL implementation of the GroupRepository trait. The member set is
//! a `BIGINT[]` column updated together with `members_count` in a single
//! conditional statement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{Group, GroupFilter, GroupKind, GroupRepository, GroupUpdate};
use crate::shared::error::AppError;

const GROUP_COLUMNS: &str = "id, name, description, slug, kind, owner_id, member_ids, \
     members_count, icon, created_at, indexed, sync_version";

#[derive(Debug, sqlx::FromRow)]
struct GroupRow {
    id: i64,
    name: String,
    description: String,
    slug: String,
    kind: String,
    owner_id: i64,
    member_ids: Vec<i64>,
    members_count: i32,
    icon: Option<String>,
    created_at: DateTime<Utc>,
    indexed: bool,
    sync_version: i64,
}

impl GroupRow {
    fn into_group(self) -> Group {
        Group {
            id: self.id,
            name: self.name,
            description: self.description,
            slug: self.slug,
            kind: GroupKind::from_str(&self.kind),
            owner_id: self.owner_id,
            member_ids: self.member_ids,
            members_count: self.members_count,
            icon: self.icon,
            created_at: self.created_at,
            indexed: self.indexed,
            sync_version: self.sync_version,
        }
    }
}

/// PostgreSQL group repository implementation.
#[derive(Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: i64) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    /// A conditional membership write touched nothing: either the group is
    /// gone or the membership was already in the requested state.
    async fn unchanged(&self, group_id: i64) -> Result<bool, AppError> {
        if self.exists(group_id).await? {
            Ok(false)
        } else {
            Err(AppError::NotFound(format!("Group {} not found", group_id)))
        }
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn create(&self, group: &Group) -> Result<Group, AppError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            INSERT INTO groups (id, name, description, slug, kind, owner_id, member_ids,
                                members_count, icon, created_at, indexed, sync_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(group.id)
        .bind(&group.name)
        .bind(&group.description)
        .bind(&group.slug)
        .bind(group.kind.as_str())
        .bind(group.owner_id)
        .bind(&group.member_ids)
        .bind(group.members_count)
        .bind(&group.icon)
        .bind(group.created_at)
        .bind(group.indexed)
        .bind(group.sync_version)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_write(e, format!("Group slug '{}' already exists", group.slug)))?;

        Ok(row.into_group())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, AppError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_group()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, AppError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_group()))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Group>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            "SELECT {GROUP_COLUMNS} FROM groups WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_group()).collect())
    }

    async fn list(
        &self,
        filter: &GroupFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Group>, AppError> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            SELECT {GROUP_COLUMNS}
            FROM groups
            WHERE ($1::BIGINT IS NULL OR owner_id = $1)
              AND ($2::TEXT IS NULL OR kind = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.owner_id)
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(limit.max(0))
        .bind(offset.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_group()).collect())
    }

    async fn list_by_member(&self, user_id: i64) -> Result<Vec<Group>, AppError> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            SELECT {GROUP_COLUMNS}
            FROM groups
            WHERE $1 = ANY(member_ids) AND kind = 'PUBLIC'
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_group()).collect())
    }

    async fn list_public_ids(&self) -> Result<Vec<i64>, AppError> {
        let ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM groups WHERE kind = 'PUBLIC'")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    async fn update(&self, id: i64, update: &GroupUpdate) -> Result<Group, AppError> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            UPDATE groups
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                icon = COALESCE($4, icon),
                indexed = FALSE,
                sync_version = sync_version + 1
            WHERE id = $1
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.description)
        .bind(&update.icon)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.into_group())
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))
    }

    async fn add_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE groups
            SET member_ids = array_append(member_ids, $2),
                members_count = members_count + 1,
                indexed = FALSE,
                sync_version = sync_version + 1
            WHERE id = $1 AND NOT ($2 = ANY(member_ids))
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        self.unchanged(group_id).await
    }

    async fn remove_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE groups
            SET member_ids = array_remove(member_ids, $2),
                members_count = members_count - 1,
                indexed = FALSE,
                sync_version = sync_version + 1
            WHERE id = $1 AND $2 = ANY(member_ids)
            "#,
        )
        .bind(group_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        self.unchanged(group_id).await
    }

    async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError> {
        let member: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM groups WHERE id = $1 AND $2 = ANY(member_ids))",
        )
        .bind(group_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(member)
    }

    async fn delete(&self, id: i64) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Group>, AppError> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            SELECT {GROUP_COLUMNS}
            FROM groups
            WHERE NOT indexed
            ORDER BY sync_attempted_at NULLS FIRST, id
            LIMIT $1
            "#
        ))
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_group()).collect())
    }

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError> {
        if ids.is_empty() {
            return Ok(());
        }

        sqlx::query("UPDATE groups SET sync_attempted_at = NOW() WHERE id = ANY($1)")
            .bind(ids)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError> {
        let indexed: Option<bool> = sqlx::query_scalar(
            "UPDATE groups SET indexed = (sync_version = $2) WHERE id = $1 RETURNING indexed",
        )
        .bind(id)
        .bind(sync_version)
        .fetch_optional(&self.pool)
        .await?;

        Ok(indexed.unwrap_or(false))
    }
}
