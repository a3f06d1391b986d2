use async_trait::async_trait;

use super::{paginate, pick, InMemoryStore};
use crate::domain::entities::{
    Comment, CommentRepository, Group, GroupFilter, GroupRepository, GroupUpdate, Post,
    PostRepository,
};
use crate::domain::search::DocumentKind;
use crate::shared::error::AppError;

fn newest_first<T>(rows: &mut [T], key: impl Fn(&T) -> (chrono::DateTime<chrono::Utc>, i64)) {
    rows.sort_by(|a, b| key(b).cmp(&key(a)));
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn create(&self, group: &Group) -> Result<Group, AppError> {
        let mut db = self.inner.write();
        if db.groups.values().any(|g| g.slug == group.slug) {
            return Err(AppError::Conflict(format!(
                "Group slug '{}' already exists",
                group.slug
            )));
        }
        db.groups.insert(group.id, group.clone());
        Ok(group.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Group>, AppError> {
        Ok(self.inner.read().groups.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, AppError> {
        Ok(self
            .inner
            .read()
            .groups
            .values()
            .find(|g| g.slug == slug)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Group>, AppError> {
        Ok(pick(&self.inner.read().groups, ids))
    }

    async fn list(
        &self,
        filter: &GroupFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Group>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Group> = db
            .groups
            .values()
            .filter(|g| filter.matches(g))
            .cloned()
            .collect();
        newest_first(&mut rows, |g| (g.created_at, g.id));
        Ok(paginate(rows, limit, offset))
    }

    async fn list_by_member(&self, user_id: i64) -> Result<Vec<Group>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Group> = db
            .groups
            .values()
            .filter(|g| g.is_public() && g.is_member(user_id))
            .cloned()
            .collect();
        newest_first(&mut rows, |g| (g.created_at, g.id));
        Ok(rows)
    }

    async fn list_public_ids(&self) -> Result<Vec<i64>, AppError> {
        Ok(self
            .inner
            .read()
            .groups
            .values()
            .filter(|g| g.is_public())
            .map(|g| g.id)
            .collect())
    }

    async fn update(&self, id: i64, update: &GroupUpdate) -> Result<Group, AppError> {
        let mut db = self.inner.write();
        let group = db
            .groups
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", id)))?;
        update.apply_to(group);
        group.indexed = false;
        group.sync_version += 1;
        Ok(group.clone())
    }

    async fn add_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError> {
        let mut db = self.inner.write();
        let group = db
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;
        if group.member_ids.contains(&user_id) {
            return Ok(false);
        }
        group.member_ids.push(user_id);
        group.members_count += 1;
        group.indexed = false;
        group.sync_version += 1;
        Ok(true)
    }

    async fn remove_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError> {
        let mut db = self.inner.write();
        let group = db
            .groups
            .get_mut(&group_id)
            .ok_or_else(|| AppError::NotFound(format!("Group {} not found", group_id)))?;
        let before = group.member_ids.len();
        group.member_ids.retain(|id| *id != user_id);
        if group.member_ids.len() == before {
            return Ok(false);
        }
        group.members_count -= 1;
        group.indexed = false;
        group.sync_version += 1;
        Ok(true)
    }

    async fn is_member(&self, group_id: i64, user_id: i64) -> Result<bool, AppError> {
        Ok(self
            .inner
            .read()
            .groups
            .get(&group_id)
            .is_some_and(|g| g.is_member(user_id)))
    }

    async fn delete(&self, id: i64) -> Result<u64, AppError> {
        Ok(self.inner.write().groups.remove(&id).map_or(0, |_| 1))
    }

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Group>, AppError> {
        let db = self.inner.read();
        Ok(db.attempts.backlog(
            DocumentKind::Group,
            db.groups.iter().filter(|(_, g)| !g.indexed),
            limit,
        ))
    }

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError> {
        self.inner.write().attempts.stamp(DocumentKind::Group, ids);
        Ok(())
    }

    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError> {
        let mut db = self.inner.write();
        Ok(match db.groups.get_mut(&id) {
            Some(g) => {
                g.indexed = g.sync_version == sync_version;
                g.indexed
            }
            None => false,
        })
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: &Post) -> Result<Post, AppError> {
        let mut db = self.inner.write();
        db.posts.insert(post.id, post.clone());
        Ok(post.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, AppError> {
        Ok(self.inner.read().posts.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Post>, AppError> {
        Ok(pick(&self.inner.read().posts, ids))
    }

    async fn list_by_group(
        &self,
        group_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        self.list_by_groups(&[group_id], limit, offset).await
    }

    async fn list_by_groups(
        &self,
        group_ids: &[i64],
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Post> = db
            .posts
            .values()
            .filter(|p| group_ids.contains(&p.group_id))
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));
        Ok(paginate(rows, limit, offset))
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Post>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Post> = db
            .posts
            .values()
            .filter(|p| p.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |p| (p.created_at, p.id));
        Ok(paginate(rows, limit, offset))
    }

    async fn find_ids_by_group(&self, group_id: i64) -> Result<Vec<i64>, AppError> {
        Ok(self
            .inner
            .read()
            .posts
            .values()
            .filter(|p| p.group_id == group_id)
            .map(|p| p.id)
            .collect())
    }

    async fn delete_by_group(&self, group_id: i64) -> Result<u64, AppError> {
        let mut db = self.inner.write();
        let before = db.posts.len();
        db.posts.retain(|_, p| p.group_id != group_id);
        Ok((before - db.posts.len()) as u64)
    }

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Post>, AppError> {
        let db = self.inner.read();
        Ok(db.attempts.backlog(
            DocumentKind::Post,
            db.posts.iter().filter(|(_, p)| !p.indexed),
            limit,
        ))
    }

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError> {
        self.inner.write().attempts.stamp(DocumentKind::Post, ids);
        Ok(())
    }

    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError> {
        let mut db = self.inner.write();
        Ok(match db.posts.get_mut(&id) {
            Some(p) => {
                p.indexed = p.sync_version == sync_version;
                p.indexed
            }
            None => false,
        })
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn create(&self, comment: &Comment) -> Result<Comment, AppError> {
        let mut db = self.inner.write();
        if !db.posts.contains_key(&comment.post_id) {
            return Err(AppError::NotFound(format!(
                "Post {} not found",
                comment.post_id
            )));
        }
        if let Some(parent_id) = comment.parent_id {
            let parent = db
                .comments
                .get_mut(&parent_id)
                .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", parent_id)))?;
            parent.replies_count += 1;
        }
        if let Some(post) = db.posts.get_mut(&comment.post_id) {
            post.comments_count += 1;
        }
        db.comments.insert(comment.id, comment.clone());
        Ok(comment.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Comment>, AppError> {
        Ok(self.inner.read().comments.get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Comment>, AppError> {
        Ok(pick(&self.inner.read().comments, ids))
    }

    async fn list_by_post(
        &self,
        post_id: i64,
        parent_id: Option<i64>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Comment> = db
            .comments
            .values()
            .filter(|c| c.post_id == post_id && c.parent_id == parent_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |c| (c.created_at, c.id));
        Ok(paginate(rows, limit, offset))
    }

    async fn list_replies(
        &self,
        parent_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Comment> = db
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent_id))
            .cloned()
            .collect();
        rows.sort_by_key(|c| (c.created_at, c.id));
        Ok(paginate(rows, limit, offset))
    }

    async fn list_by_author(
        &self,
        author_id: i64,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Comment>, AppError> {
        let db = self.inner.read();
        let mut rows: Vec<Comment> = db
            .comments
            .values()
            .filter(|c| c.author_id == author_id)
            .cloned()
            .collect();
        newest_first(&mut rows, |c| (c.created_at, c.id));
        Ok(paginate(rows, limit, offset))
    }

    async fn find_ids_by_posts(&self, post_ids: &[i64]) -> Result<Vec<i64>, AppError> {
        Ok(self
            .inner
            .read()
            .comments
            .values()
            .filter(|c| post_ids.contains(&c.post_id))
            .map(|c| c.id)
            .collect())
    }

    async fn delete_by_posts(&self, post_ids: &[i64]) -> Result<u64, AppError> {
        let mut db = self.inner.write();
        let before = db.comments.len();
        db.comments.retain(|_, c| !post_ids.contains(&c.post_id));
        Ok((before - db.comments.len()) as u64)
    }

    async fn list_unindexed(&self, limit: i64) -> Result<Vec<Comment>, AppError> {
        let db = self.inner.read();
        Ok(db.attempts.backlog(
            DocumentKind::Comment,
            db.comments.iter().filter(|(_, c)| !c.indexed),
            limit,
        ))
    }

    async fn mark_attempted(&self, ids: &[i64]) -> Result<(), AppError> {
        self.inner.write().attempts.stamp(DocumentKind::Comment, ids);
        Ok(())
    }

    async fn mark_indexed(&self, id: i64, sync_version: i64) -> Result<bool, AppError> {
        let mut db = self.inner.write();
        Ok(match db.comments.get_mut(&id) {
            Some(c) => {
                c.indexed = c.sync_version == sync_version;
                c.indexed
            }
            None => false,
        })
    }
}
