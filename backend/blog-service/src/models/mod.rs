/// Data models for blog-service
///
/// Row types mirror the tables in `migrations/`; `*View` types carry the
/// joined columns the pages need (author username, group slug/title).
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use std::fmt;

/// Number of characters shown when a post or comment is displayed by itself
pub const SUMMARY_CHARS: usize = 15;

fn summary(text: &str) -> &str {
    match text.char_indices().nth(SUMMARY_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Topical category a post can be filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone)]
pub struct NewGroup {
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub group_id: Option<i64>,
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(summary(&self.text))
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Full replacement of the editable post fields
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// A post joined with its author and (optional) group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct PostView {
    pub id: i64,
    pub text: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub author_id: i64,
    pub author_username: String,
    pub group_id: Option<i64>,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub comment_count: i64,
}

/// Slug and title of the group a post belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupRef<'a> {
    pub slug: &'a str,
    pub title: &'a str,
}

impl PostView {
    pub fn group(&self) -> Option<GroupRef<'_>> {
        match (&self.group_slug, &self.group_title) {
            (Some(slug), Some(title)) => Some(GroupRef { slug, title }),
            _ => None,
        }
    }
}

impl fmt::Display for PostView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(summary(&self.text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub author_id: i64,
}

impl fmt::Display for Comment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(summary(&self.text))
    }
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CommentView {
    pub id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub post_id: i64,
    pub author_id: i64,
    pub author_username: String,
}

/// Subscription of `user_id` to the posts of `author_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}

/// Which posts a listing shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(i64),
    /// Posts by every author `user_id` follows
    FollowedBy(i64),
}
