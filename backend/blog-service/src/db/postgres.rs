use super::{Repository, StoreResult};
use crate::models::{
    Comment, CommentView, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter,
    PostView, User,
};
use sqlx::{PgPool, Row};

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.text, p.image, p.created_at, p.author_id,
           u.username AS author_username,
           p.group_id, g.slug AS group_slug, g.title AS group_title,
           (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
    FROM posts p
    JOIN users u ON u.id = p.author_id
    LEFT JOIN post_groups g ON g.id = p.group_id
"#;

/// WHERE clause for a listing filter and the value bound to `$1`
fn filter_clause(filter: PostFilter) -> (&'static str, Option<i64>) {
    match filter {
        PostFilter::All => ("", None),
        PostFilter::Group(group_id) => ("WHERE p.group_id = $1", Some(group_id)),
        PostFilter::Author(author_id) => ("WHERE p.author_id = $1", Some(author_id)),
        PostFilter::FollowedBy(user_id) => (
            "WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = $1)",
            Some(user_id),
        ),
    }
}

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgRepository {
    pool: PgPool,
}

impl PgRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Repository for PgRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let affected = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn create_group(&self, group: NewGroup) -> StoreResult<Group> {
        let group = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO post_groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_id(&self, id: i64) -> StoreResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_group_by_slug(&self, slug: &str) -> StoreResult<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn delete_group(&self, id: i64) -> StoreResult<bool> {
        let affected = sqlx::query("DELETE FROM post_groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (text, image, author_id, group_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, text, image, created_at, author_id, group_id
            "#,
        )
        .bind(&post.text)
        .bind(&post.image)
        .bind(post.author_id)
        .bind(post.group_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(post)
    }

    async fn find_post(&self, id: i64) -> StoreResult<Option<PostView>> {
        let sql = format!("{POST_VIEW_SELECT} WHERE p.id = $1");
        let post = sqlx::query_as::<_, PostView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET text = $1, group_id = $2, image = $3
            WHERE id = $4
            RETURNING id, text, image, created_at, author_id, group_id
            "#,
        )
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(&changes.image)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        let affected = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn count_posts(&self, filter: PostFilter) -> StoreResult<i64> {
        let (clause, param) = filter_clause(filter);
        let sql = format!("SELECT COUNT(*) AS count FROM posts p {clause}");

        let mut query = sqlx::query(&sql);
        if let Some(value) = param {
            query = query.bind(value);
        }
        let row = query.fetch_one(&self.pool).await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<PostView>> {
        let (clause, param) = filter_clause(filter);
        let first = if param.is_some() { 2 } else { 1 };
        let sql = format!(
            "{POST_VIEW_SELECT} {clause} ORDER BY p.created_at DESC, p.id DESC LIMIT ${} OFFSET ${}",
            first,
            first + 1
        );

        let mut query = sqlx::query_as::<_, PostView>(&sql);
        if let Some(value) = param {
            query = query.bind(value);
        }
        let posts = query
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (text, post_id, author_id)
            VALUES ($1, $2, $3)
            RETURNING id, text, created_at, post_id, author_id
            "#,
        )
        .bind(&comment.text)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> StoreResult<Vec<CommentView>> {
        let comments = sqlx::query_as::<_, CommentView>(
            r#"
            SELECT c.id, c.text, c.created_at, c.post_id, c.author_id,
                   u.username AS author_username
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn follow(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        let inserted = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO follows (user_id, author_id)
            VALUES ($1, $2)
            ON CONFLICT ON CONSTRAINT unique_follower DO NOTHING
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted.is_some())
    }

    async fn unfollow(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE user_id = $1 AND author_id = $2
            "#,
        )
        .bind(user_id)
        .bind(author_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = $1 AND author_id = $2) AS following",
        )
        .bind(user_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<bool, _>("following"))
    }

    async fn count_followers(&self, author_id: i64) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM follows WHERE author_id = $1")
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn count_following(&self, user_id: i64) -> StoreResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM follows WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<i64, _>("count"))
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = db_pool::acquire_with_metrics(&self.pool, "blog-service").await?;
        sqlx::query("SELECT 1").execute(&mut *conn).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_clause_binds_only_when_filtered() {
        assert_eq!(filter_clause(PostFilter::All), ("", None));
        assert_eq!(filter_clause(PostFilter::Group(3)).1, Some(3));
        assert_eq!(filter_clause(PostFilter::Author(5)).1, Some(5));

        let (clause, param) = filter_clause(PostFilter::FollowedBy(9));
        assert!(clause.contains("follows"));
        assert_eq!(param, Some(9));
    }
}
