//! Shared fixtures for the HTTP tests: an app on the in-memory backends,
//! seeded users/groups/posts, session cookies and multipart bodies.
#![allow(dead_code)]

use actix_web::cookie::Cookie;
use actix_web::http::header;
use actix_web::test::TestRequest;
use blog_service::config::Config;
use blog_service::db::{MemoryRepository, Repository, StoreError, StoreResult};
use blog_service::models::{
    Comment, CommentView, Group, NewComment, NewGroup, NewPost, Post, PostChanges, PostFilter,
    PostView, User,
};
use blog_service::AppState;
use image::{ImageBuffer, ImageFormat, Rgb};
use page_cache::{MemoryPageCache, PageCache};
use std::io::Cursor;
use std::sync::Arc;
use tempfile::TempDir;

pub const BOUNDARY: &str = "----blogtestboundary7MA4YWxkTrZu0gW";

/// Build the service under test from a [`TestEnv`]
macro_rules! init_app {
    ($env:expr) => {{
        let state = $env.state.clone();
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(state.clone()))
                .wrap(blog_service::middleware::SessionMiddleware::new(
                    state.sessions.clone(),
                ))
                .configure(|cfg| blog_service::routes::configure(cfg, &state)),
        )
        .await
    }};
}

/// Call the app, assert a 200 and return the body as text
macro_rules! html_ok {
    ($app:expr, $req:expr $(,)?) => {{
        let resp = actix_web::test::call_service($app, $req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        String::from_utf8(actix_web::test::read_body(resp).await.to_vec()).unwrap()
    }};
}

pub struct TestEnv {
    pub state: AppState,
    pub repo: Arc<MemoryRepository>,
    pub cache: Arc<MemoryPageCache>,
    pub media_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_repository(|repo| repo as Arc<dyn Repository>)
    }

    /// Like [`TestEnv::new`], with post inserts and updates failing in storage
    pub fn with_failing_post_writes() -> Self {
        Self::with_repository(|repo| {
            Arc::new(FailingPostWrites { inner: repo }) as Arc<dyn Repository>
        })
    }

    fn with_repository(wrap: impl FnOnce(Arc<MemoryRepository>) -> Arc<dyn Repository>) -> Self {
        let media_dir = tempfile::tempdir().expect("media tempdir");
        let mut config = Config::default();
        config.media.root = media_dir.path().to_path_buf();

        let repo = Arc::new(MemoryRepository::new());
        let cache = Arc::new(MemoryPageCache::new());
        let state = AppState::new(
            config,
            wrap(repo.clone()),
            cache.clone() as Arc<dyn PageCache>,
        );

        Self {
            state,
            repo,
            cache,
            media_dir,
        }
    }

    pub async fn user(&self, username: &str) -> User {
        self.repo
            .create_user(username, "not-a-real-hash")
            .await
            .expect("create user")
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.repo
            .create_group(NewGroup {
                title: title.to_string(),
                slug: slug.to_string(),
                description: "Test description".to_string(),
            })
            .await
            .expect("create group")
    }

    pub async fn post(&self, author: &User, group: Option<&Group>, text: &str) -> Post {
        self.repo
            .create_post(NewPost {
                author_id: author.id,
                text: text.to_string(),
                group_id: group.map(|g| g.id),
                image: None,
            })
            .await
            .expect("create post")
    }

    pub async fn posts(&self, author: &User, group: Option<&Group>, count: usize) -> Vec<Post> {
        let mut posts = Vec::with_capacity(count);
        for i in 0..count {
            posts.push(self.post(author, group, &format!("Test post {}", i)).await);
        }
        posts
    }

    pub fn session(&self, user: &User) -> Cookie<'static> {
        self.state
            .sessions
            .login_cookie(user)
            .expect("session cookie")
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await.expect("clear page cache");
    }

    /// Files stored under the media `posts/` directory
    pub fn stored_images(&self) -> usize {
        std::fs::read_dir(self.media_dir.path().join("posts"))
            .map(|dir| dir.count())
            .unwrap_or(0)
    }
}

/// Memory repository whose post inserts and updates fail like a foreign key
/// violation raised by the database after the form was validated
struct FailingPostWrites {
    inner: Arc<MemoryRepository>,
}

fn group_fk_violation() -> StoreError {
    StoreError::ForeignKeyViolation("posts_group_id_fkey".to_string())
}

#[async_trait::async_trait]
impl Repository for FailingPostWrites {
    async fn create_user(&self, username: &str, password_hash: &str) -> StoreResult<User> {
        self.inner.create_user(username, password_hash).await
    }
    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.inner.find_user_by_username(username).await
    }
    async fn delete_user(&self, id: i64) -> StoreResult<bool> {
        self.inner.delete_user(id).await
    }
    async fn create_group(&self, group: NewGroup) -> StoreResult<Group> {
        self.inner.create_group(group).await
    }
    async fn find_group_by_id(&self, id: i64) -> StoreResult<Option<Group>> {
        self.inner.find_group_by_id(id).await
    }
    async fn find_group_by_slug(&self, slug: &str) -> StoreResult<Option<Group>> {
        self.inner.find_group_by_slug(slug).await
    }
    async fn list_groups(&self) -> StoreResult<Vec<Group>> {
        self.inner.list_groups().await
    }
    async fn delete_group(&self, id: i64) -> StoreResult<bool> {
        self.inner.delete_group(id).await
    }
    async fn create_post(&self, _post: NewPost) -> StoreResult<Post> {
        Err(group_fk_violation())
    }
    async fn find_post(&self, id: i64) -> StoreResult<Option<PostView>> {
        self.inner.find_post(id).await
    }
    async fn update_post(&self, _id: i64, _changes: PostChanges) -> StoreResult<Option<Post>> {
        Err(group_fk_violation())
    }
    async fn delete_post(&self, id: i64) -> StoreResult<bool> {
        self.inner.delete_post(id).await
    }
    async fn count_posts(&self, filter: PostFilter) -> StoreResult<i64> {
        self.inner.count_posts(filter).await
    }
    async fn list_posts(
        &self,
        filter: PostFilter,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<PostView>> {
        self.inner.list_posts(filter, limit, offset).await
    }
    async fn create_comment(&self, comment: NewComment) -> StoreResult<Comment> {
        self.inner.create_comment(comment).await
    }
    async fn list_comments(&self, post_id: i64) -> StoreResult<Vec<CommentView>> {
        self.inner.list_comments(post_id).await
    }
    async fn follow(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        self.inner.follow(user_id, author_id).await
    }
    async fn unfollow(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        self.inner.unfollow(user_id, author_id).await
    }
    async fn is_following(&self, user_id: i64, author_id: i64) -> StoreResult<bool> {
        self.inner.is_following(user_id, author_id).await
    }
    async fn count_followers(&self, author_id: i64) -> StoreResult<i64> {
        self.inner.count_followers(author_id).await
    }
    async fn count_following(&self, user_id: i64) -> StoreResult<i64> {
        self.inner.count_following(user_id).await
    }
    async fn ping(&self) -> StoreResult<()> {
        self.inner.ping().await
    }
}

/// Part of a multipart/form-data body
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name)
                        .as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            Part::File(name, filename, bytes) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                        name, filename
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
                body.extend_from_slice(bytes);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

/// POST a multipart form to `uri`
pub fn multipart_request(uri: &str, parts: &[Part<'_>]) -> TestRequest {
    TestRequest::post()
        .uri(uri)
        .insert_header((
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        ))
        .set_payload(multipart_body(parts))
}

/// A tiny valid PNG
pub fn png_bytes() -> Vec<u8> {
    let img: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_pixel(2, 2, Rgb([200, 30, 30]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

pub fn location(resp: &actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Number of post cards on a rendered page
pub fn post_count(html: &str) -> usize {
    html.matches(r#"<article class="post""#).count()
}

/// Ids of the post cards on a rendered page, in order
pub fn post_ids(html: &str) -> Vec<i64> {
    html.split(r#"data-post-id=""#)
        .skip(1)
        .filter_map(|rest| rest.split('"').next())
        .filter_map(|id| id.parse().ok())
        .collect()
}
