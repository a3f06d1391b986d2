//! Group entity and repository trait.
//!
//! Maps to the `groups` table in the database schema.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::AppError;

/// Group visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum GroupKind {
    #[default]
    Public,
    Private,
}

impl GroupKind {
    /// Convert from database string representation.
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PRIVATE" => Self::Private,
            _ => Self::Public,
        }
    }

    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
        }
    }
}

impl std::fmt::Display for GroupKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A community group.
///
/// Maps to the `groups` table:
/// - id: BIGINT PRIMARY KEY (Snowflake ID)
/// - name, description: TEXT NOT NULL
/// - slug: TEXT NOT NULL UNIQUE
/// - kind: TEXT NOT NULL ('PUBLIC' | 'PRIVATE')
/// - owner_id: BIGINT NOT NULL
/// - member_ids: BIGINT[] NOT NULL
/// - members_count: INTEGER NOT NULL -- always cardinality(member_ids)
/// - icon: TEXT NULL
/// - created_at: TIMESTAMPTZ NOT NULL
/// - indexed: BOOLEAN NOT NULL DEFAULT FALSE
/// - sync_version: BIGINT NOT NULL DEFAULT 0 -- bumped by every mirrored-field write
/// - sync_attempted_at: TIMESTAMPTZ NULL -- last backlog attempt, not loaded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub slug: String,
    pub kind: GroupKind,
    pub owner_id: i64,
    pub member_ids: Vec<i64>,
    pub members_count: i32,
    pub icon: Option<String>,
    pub created_at: DateTime<Utc>,
    pub indexed: bool,
    pub sync_version: i64,
}

impl Group {
    pub fn is_owner(&self, user_id: i64) -> bool {
        self.owner_id == user_id
    }

    pub fn is_member(&self, user_id: i64) -> bool {
        self.member_ids.contains(&user_id)
    }

    pub fn is_public(&self) -> bool {
        self.kind == GroupKind::Public
    }
}

/// Partial update of a group's descriptive fields.
#[derive(Debug, Clone, Default)]
pub struct GroupUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
}

impl GroupUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.icon.is_none()
    }

    pub fn apply_to(&self, group: &mut Group) {
        if let Some(name) = &self.name {
            group.name = name.clone();
        }
        if let Some(description) = &self.description {
            group.description = description.clone();
        }
        if let Some(icon) = &self.icon {
            group.icon = Some(icon.clone());
        }
    }
}

/// Filter for listing groups.
#[derive(Debug, Clone, Default)]
pub struct GroupFilter {
    pub owner_id: Option<i64>,
    pub kind: Option<GroupKind>,
}

impl GroupFilter {
    pub fn matches(&self, group: &Group) -> bool {
        self.owner_id.map_or(true, |o| group.owner_id == o)
            && self.kind.map_or(true, |k| group.kind == k)
    }
}

/// Repository trait for Group data access operations.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Insert a new group. A duplicate slug is a conflict.
    async fn create(&self, group: &Group) -> Result<Group, AppError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, AppError>;

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Group>, AppError>;

    async fn list(&self, filter: &GroupFilter, limit: i64, offset: i64)
        -> Result<Vec<Group>, AppError>;

    /// Public groups the user belongs to.
    async fn list_by_member(&self, user_id: i64) -> Result<Vec<Group>, AppError>;

    /// Ids of every public group.
    async fn list_public_ids(&self) -> Result<Vec<i64>, AppError>;

    /// Update descriptive fields, bump `sync_version` and clear `indexed`.
    async fn update(&self, id: i64, update: &GroupUpdate) -> Result<Group, AppError>;

    /// Add `user_id` to the member set and bump the count in one conditional
    /// write. Returns `false` if the user was already a member.
    async fn add_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Remove `user_id` from the member set and decrement the count in one
    /// conditional write. Returns `false` if the user was not a member.
    async fn remove_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError>;

    async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError>;

    /// Conditional delete; removing an absent group is not an error.
    async fn delete(&self, id: i64) -> Result<u64, AppError>;

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Group>, AppError>;

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError>;

    /// Conditional on `sync_version`; a stale version clears the flag instead.
    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError>;
}
