use super::{
    Repository, StoreError, StoreResult, GROUPS_SLUG_KEY, NOT_SELF_FOLLOW, USERS_USERNAME_KEY,
};
use crate::models::{
    Comment, CommentView, Follow, Group, NewComment, NewGroup, NewPost, Post, PostChanges,
    PostFilter, PostView, User,
};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    follows: BTreeMap<i64, Follow>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn post_view(&self, post: &Post) -> Option<PostView> {
        let author = self.users.get(&post.author_id)?;
        let group = post.group_id.and_then(|id| self.groups.get(&id));
        let comment_count = self
            .comments
            .values()
            .filter(|c| c.post_id == post.id)
            .count() as i64;

        Some(PostView {
            id: post.id,
            text: post.text.clone(),
            image: post.image.clone(),
            created_at: post.created_at,
            author_id: post.author_id,
            author_username: author.username.clone(),
            group_id: post.group_id,
            group_slug: group.map(|g| g.slug.clone()),
            group_title: group.map(|g| g.title.clone()),
            comment_count,
        })
    }

    fn matches(&self, post: &Post, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group_id) => post.group_id == Some(group_id),
            PostFilter::Author(author_id) => post.author_id == author_id,
            PostFilter::FollowedBy(user_id) => self
                .follows
                .values()
                .any(|f| f.user_id == user_id && f.author_id == post.author_id),
        }
    }

    fn check_group(&self, group_id: Option<i64>) -> StoreResult<()> {
        match group_id {
            Some(id) if !self.groups.contains_key(&id) => Err(StoreError::ForeignKeyViolation(
                "posts_group_id_fkey".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn remove_post(&mut self, post_id: i64) -> bool {
        let removed = self.posts.remove(&post_id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post_id != post_id);
        }
        removed
    }
}

/// In-process repository holding every table behind one lock
///
/// Enforces the same unique, check and foreign-key rules as the SQL schema,
/// including the cascades on user and post deletion and `SET NULL` on group
/// deletion.
#[derive(Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Repository for MemoryRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.username == username) {
            return Err(StoreError::UniqueViolation(USERS_USERNAME_KEY.to_string()));
        }

        let user = User {
            id: state.next_id(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(self.state.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.users.remove(&id).is_none() {
            return Ok(false);
        }

        let authored: Vec<i64> = state
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            state.remove_post(post_id);
        }
        state.comments.retain(|_, c| c.author_id != id);
        state
            .follows
            .retain(|_, f| f.user_id != id && f.author_id != id);
        Ok(true)
    }

    async fn create_group(&self, group: NewGroup) -> StoreResult<Group> {
        let mut state = self.state.write().await;
        if state.groups.values().any(|g| g.slug == group.slug) {
            return Err(StoreError::UniqueViolation(GROUPS_SLUG_KEY.to_string()));
        }

        let group = Group {
            id: state.next_id(),
            title: group.title,
            slug: group.slug,
            description: group.description,
        };
        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find_group_by_id(&self, id: i64) -> StoreResult<Option<Group>> {
        Ok(self.state.read().await.groups.get(&id).cloned())
    }

    async fn find_group_by_slug(&self, slug: &str) -> StoreResult<Option<Group>> {
        let state = self.state.read().await;
        Ok(state.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        let state = self.state.read().await;
        let mut groups: Vec<Group> = state.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn delete_group(&self, id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if state.groups.remove(&id).is_none() {
            return Ok(false);
        }

        for post in state.posts.values_mut() {
            if post.group_id == Some(id) {
                post.group_id = None;
            }
        }
        Ok(true)
    }

    async fn create_post(&self, post: NewPost) -> StoreResult<Post> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&post.author_id) {
            return Err(StoreError::ForeignKeyViolation(
                "posts_author_id_fkey".to_string(),
            ));
        }
        state.check_group(post.group_id)?;

        let post = Post {
            id: state.next_id(),
            text: post.text,
            image: post.image,
            created_at: Utc::now(),
            author_id: post.author_id,
            group_id: post.group_id,
        };
        state.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find_post(&self, id: i64) -> StoreResult<Option<PostView>> {
        let state = self.state.read().await;
        Ok(state.posts.get(&id).and_then(|p| state.post_view(p)))
    }

    async fn update_post(&self, id: i64, changes: PostChanges) -> StoreResult<Option<Post>> {
        let mut state = self.state.write().await;
        state.check_group(changes.group_id)?;

        let Some(post) = state.posts.get_mut(&id) else {
            return Ok(None);
        };
        post.text = changes.text;
        post.group_id = changes.group_id;
        post.image = changes.image;
        Ok(Some(post.clone()))
    }

    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        Ok(self.state.write().await.remove_post(id))
    }

    async fn count_posts(&self, filter: PostFilter) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .posts
            .values()
            .filter(|p| state.matches(p, filter))
            .count() as i64)
    }

    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<PostView>> {
        let state = self.state.read().await;
        let mut posts: Vec<&Post> = state
            .posts
            .values()
            .filter(|p| state.matches(p, filter))
            .collect();
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });

        Ok(posts
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .filter_map(|p| state.post_view(p))
            .collect())
    }

    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&comment.post_id) {
            return Err(StoreError::ForeignKeyViolation(
                "comments_post_id_fkey".to_string(),
            ));
        }
        if !state.users.contains_key(&comment.author_id) {
            return Err(StoreError::ForeignKeyViolation(
                "comments_author_id_fkey".to_string(),
            ));
        }

        let comment = Comment {
            id: state.next_id(),
            text: comment.text,
            created_at: Utc::now(),
            post_id: comment.post_id,
            author_id: comment.author_id,
        };
        state.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn list_comments(&self, post_id: i64) -> StoreResult<Vec<CommentView>> {
        let state = self.state.read().await;
        let mut comments: Vec<CommentView> = state
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = state.users.get(&c.author_id)?;
                Some(CommentView {
                    id: c.id,
                    text: c.text.clone(),
                    created_at: c.created_at,
                    post_id: c.post_id,
                    author_id: c.author_id,
                    author_username: author.username.clone(),
                })
            })
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(comments)
    }

    async fn follow(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        if user_id == author_id {
            return Err(StoreError::CheckViolation(NOT_SELF_FOLLOW.to_string()));
        }
        if !state.users.contains_key(&user_id) || !state.users.contains_key(&author_id) {
            return Err(StoreError::ForeignKeyViolation(
                "follows_user_id_fkey".to_string(),
            ));
        }
        if state
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.author_id == author_id)
        {
            return Ok(false);
        }

        let id = state.next_id();
        state.follows.insert(
            id,
            Follow {
                id,
                user_id,
                author_id,
            },
        );
        Ok(true)
    }

    async fn unfollow(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        let mut state = self.state.write().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|_, f| !(f.user_id == user_id && f.author_id == author_id));
        Ok(state.follows.len() < before)
    }

    async fn is_following(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .values()
            .any(|f| f.user_id == user_id && f.author_id == author_id))
    }

    async fn count_followers(&self, author_id: i64) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .values()
            .filter(|f| f.author_id == author_id)
            .count() as i64)
    }

    async fn count_following(&self, user_id: i64) -> StoreResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .follows
            .values()
            .filter(|f| f.user_id == user_id)
            .count() as i64)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

impl MemoryRepository {
    /// Distinct (user, author) follow pairs
    pub async fn follow_pairs(&self) -> HashSet<(i64, i64)> {
        let state = self.state.read().await;
        state
            .follows
            .values()
            .map(|f| (f.user_id, f.author_id))
            .collect()
    }

    pub async fn follow_rows(&self) -> usize {
        self.state.read().await.follows.len()
    }
}
