use super::{escape, field_errors, layout, non_field_errors};
use crate::forms::{FormErrors, PostForm};
use crate::media::media_url;
use crate::models::{CommentView, Group, PostView, User};
use crate::pagination::Page;
use crate::security::SessionUser;

pub const INDEX_TITLE: &str = "Latest updates";
const DETAIL_TITLE_CHARS: usize = 30;

fn profile_href(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// One post as it appears in listings and on the detail page
pub fn post_card(post: &PostView, show_group_link: bool) -> String {
    let image = post
        .image
        .as_deref()
        .map(|path| {
            format!(
                r#"
      <img class="post-image" src="{}" alt="">"#,
                escape(&media_url(path))
            )
        })
        .unwrap_or_default();

    let group = match (post.group(), show_group_link) {
        (Some(group), true) => format!(
            r#"
      <a class="post-group" href="/group/{}/">#{}</a>"#,
            urlencoding::encode(group.slug),
            escape(group.title)
        ),
        _ => String::new(),
    };

    format!(
        r#"    <article class="post" data-post-id="{id}">
      <ul class="post-meta">
        <li>Author: <a href="{author_href}">{author}</a></li>
        <li>Published: <time datetime="{created_iso}">{created}</time></li>
      </ul>{image}
      <p class="post-text">{text}</p>
      <a class="post-detail" href="/posts/{id}/">Details</a> <span class="comment-count">{comments} comments</span>{group}
    </article>
"#,
        id = post.id,
        author_href = profile_href(&post.author_username),
        author = escape(&post.author_username),
        created_iso = post.created_at.to_rfc3339(),
        created = post.created_at.format("%d %b %Y"),
        image = image,
        text = escape(&post.text).replace('\n', "<br>"),
        comments = post.comment_count,
        group = group,
    )
}

/// Previous / next links; `base` is the listing path
pub fn paginator<T>(page: &Page<T>, base: &str) -> String {
    if page.num_pages <= 1 {
        return String::new();
    }

    let mut links = Vec::new();
    if let Some(prev) = page.previous_number() {
        links.push(format!(r#"<a href="{base}?page=1">&laquo; first</a>"#));
        links.push(format!(r#"<a href="{base}?page={prev}">previous</a>"#));
    }
    links.push(format!(
        r#"<span class="current">Page {} of {}</span>"#,
        page.number, page.num_pages
    ));
    if let Some(next) = page.next_number() {
        links.push(format!(r#"<a href="{base}?page={next}">next</a>"#));
        links.push(format!(
            r#"<a href="{base}?page={}">last &raquo;</a>"#,
            page.num_pages
        ));
    }

    format!(
        r#"    <nav class="pagination">{}</nav>
"#,
        links.join(" ")
    )
}

fn listing(page: &Page<PostView>, base: &str, show_group_link: bool) -> String {
    let posts: String = page
        .items
        .iter()
        .map(|post| post_card(post, show_group_link))
        .collect();
    format!("{}{}", posts, paginator(page, base))
}

pub fn index_page(page: &Page<PostView>, viewer: Option<&SessionUser>) -> String {
    let content = format!(
        "    <h1>{}</h1>\n{}",
        INDEX_TITLE,
        listing(page, "/", true)
    );
    layout(INDEX_TITLE, "index", viewer, &content)
}

pub fn group_page(group: &Group, page: &Page<PostView>, viewer: Option<&SessionUser>) -> String {
    let base = format!("/group/{}/", urlencoding::encode(&group.slug));
    let content = format!(
        r#"    <h1>{title}</h1>
    <p class="group-description">{description}</p>
{listing}"#,
        title = escape(&group.title),
        description = escape(&group.description),
        listing = listing(page, &base, false),
    );
    layout(&group.title, "group", viewer, &content)
}

/// Follow state shown on a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowButton {
    /// Guest, or the author looking at their own profile
    Hidden,
    Follow,
    Unfollow,
}

pub fn profile_page(
    author: &User,
    page: &Page<PostView>,
    followers: i64,
    following: FollowButton,
    viewer: Option<&SessionUser>,
) -> String {
    let title = format!("Profile of user {}", author.username);
    let base = profile_href(&author.username);

    let button = match following {
        FollowButton::Hidden => String::new(),
        FollowButton::Follow => format!(
            r#"
    <a class="follow-button" data-following="false" href="{base}follow/">Follow</a>"#
        ),
        FollowButton::Unfollow => format!(
            r#"
    <a class="follow-button" data-following="true" href="{base}unfollow/">Unfollow</a>"#
        ),
    };

    let content = format!(
        r#"    <h1>All posts by {author}</h1>
    <p class="profile-stats">Posts: {total} &middot; Followers: {followers}</p>{button}
{listing}"#,
        author = escape(&author.username),
        total = page.total,
        followers = followers,
        button = button,
        listing = listing(page, &base, true),
    );
    layout(&title, "profile", viewer, &content)
}

pub fn follow_page(page: &Page<PostView>, viewer: Option<&SessionUser>) -> String {
    let content = format!(
        "    <h1>Subscriptions</h1>\n{}",
        listing(page, "/follow/", true)
    );
    layout("Subscriptions", "follow", viewer, &content)
}

fn comment_form(post_id: i64, errors: &FormErrors, text: &str) -> String {
    format!(
        r#"    <form class="comment-form" method="post" action="/posts/{post_id}/comment/">
      <label for="id_comment_text">Comment text</label>
      <textarea name="text" id="id_comment_text" required>{text}</textarea>
      <small>Enter the comment text</small>
      {errors}
      <button type="submit">Send</button>
    </form>
"#,
        post_id = post_id,
        text = escape(text),
        errors = field_errors(errors, "text"),
    )
}

pub fn post_detail_page(
    post: &PostView,
    comments: &[CommentView],
    author_posts: i64,
    viewer: Option<&SessionUser>,
) -> String {
    let title_text: String = post.text.chars().take(DETAIL_TITLE_CHARS).collect();
    let title = format!("Post {}", title_text);

    let is_author = viewer.map(|v| v.id == post.author_id).unwrap_or(false);
    let edit_link = if is_author {
        format!(
            r#"    <a class="post-edit" href="/posts/{}/edit/">Edit post</a>
"#,
            post.id
        )
    } else {
        String::new()
    };

    let comment_items: String = comments
        .iter()
        .map(|c| {
            format!(
                r#"      <li class="comment" data-comment-id="{id}">
        <a href="{href}">{author}</a>
        <p>{text}</p>
      </li>
"#,
                id = c.id,
                href = profile_href(&c.author_username),
                author = escape(&c.author_username),
                text = escape(&c.text),
            )
        })
        .collect();

    let form = if viewer.is_some() {
        comment_form(post.id, &FormErrors::new(), "")
    } else {
        String::new()
    };

    let content = format!(
        r#"{card}    <p class="author-posts">Posts by this author: {author_posts}</p>
{edit_link}    <section class="comments">
      <ul>
{comment_items}      </ul>
{form}    </section>
"#,
        card = post_card(post, true),
        author_posts = author_posts,
        edit_link = edit_link,
        comment_items = comment_items,
        form = form,
    );
    layout(&title, "post-detail", viewer, &content)
}

/// Create and edit form; `post` is the post being edited
pub fn post_form_page(
    form: &PostForm,
    errors: &FormErrors,
    groups: &[Group],
    post: Option<&PostView>,
    viewer: Option<&SessionUser>,
) -> String {
    let (title, action, button) = match post {
        Some(p) => ("Edit post", format!("/posts/{}/edit/", p.id), "Save"),
        None => ("New post", "/create/".to_string(), "Add"),
    };

    let selected = form.group.trim();
    let mut options = format!(
        r#"<option value=""{}>---------</option>"#,
        if selected.is_empty() { " selected" } else { "" }
    );
    for group in groups {
        let value = group.id.to_string();
        options.push_str(&format!(
            r#"<option value="{value}"{sel}>{title}</option>"#,
            value = value,
            sel = if value == selected { " selected" } else { "" },
            title = escape(&group.title),
        ));
    }

    let current_image = post
        .and_then(|p| p.image.as_deref())
        .map(|path| {
            format!(
                r#"
      <p class="current-image">Currently: <a href="{href}">{path}</a>
        <input type="checkbox" name="clear_image" id="id_clear_image"> <label for="id_clear_image">Clear</label></p>"#,
                href = escape(&media_url(path)),
                path = escape(path),
            )
        })
        .unwrap_or_default();

    let content = format!(
        r#"    <h1>{title}</h1>
    <form class="post-form" method="post" action="{action}" enctype="multipart/form-data">
      {non_field}
      <label for="id_text">Post text</label>
      <textarea name="text" id="id_text" required>{text}</textarea>
      <small>Enter the post text</small>
      {text_errors}
      <label for="id_group">Group</label>
      <select name="group" id="id_group">{options}</select>
      <small>Group the post will belong to</small>
      {group_errors}
      <label for="id_image">Image</label>{current_image}
      <input type="file" name="image" id="id_image" accept="image/*">
      {image_errors}
      <button type="submit">{button}</button>
    </form>
"#,
        title = title,
        action = action,
        non_field = non_field_errors(errors),
        text = escape(&form.text),
        text_errors = field_errors(errors, "text"),
        options = options,
        group_errors = field_errors(errors, "group"),
        current_image = current_image,
        image_errors = field_errors(errors, "image"),
        button = button,
    );
    let page = if post.is_some() { "post-edit" } else { "post-create" };
    layout(title, page, viewer, &content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn view(id: i64, text: &str) -> PostView {
        PostView {
            id,
            text: text.to_string(),
            image: Some("posts/a.png".to_string()),
            created_at: Utc::now(),
            author_id: 1,
            author_username: "auth".to_string(),
            group_id: Some(2),
            group_slug: Some("test_slug".to_string()),
            group_title: Some("Test group".to_string()),
            comment_count: 3,
        }
    }

    #[test]
    fn test_post_card_escapes_and_links() {
        let html = post_card(&view(7, "<b>bold</b>"), true);
        assert!(html.contains(r#"data-post-id="7""#));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(html.contains(r#"href="/group/test_slug/""#));
        assert!(html.contains(r#"src="/media/posts/a.png""#));
        assert!(html.contains(r#"href="/profile/auth/""#));
    }

    #[test]
    fn test_paginator_links() {
        let page = Page {
            items: vec![view(1, "x")],
            number: 1,
            num_pages: 2,
            total: 14,
        };
        let html = paginator(&page, "/");
        assert!(html.contains(r#"href="/?page=2""#));
        assert!(!html.contains("previous"));

        let single = Page::<PostView> {
            items: Vec::new(),
            number: 1,
            num_pages: 1,
            total: 0,
        };
        assert_eq!(paginator(&single, "/"), "");
    }

    #[test]
    fn test_post_form_selects_group() {
        let groups = vec![Group {
            id: 2,
            title: "Test group".to_string(),
            slug: "test_slug".to_string(),
            description: String::new(),
        }];
        let form = PostForm::initial("Hello", Some(2));
        let html = post_form_page(&form, &FormErrors::new(), &groups, None, None);
        assert!(html.contains(r#"<option value="2" selected>Test group</option>"#));
        assert!(html.contains(r#"data-page="post-create""#));
        assert!(html.contains("Enter the post text"));
        assert!(html.contains("Group the post will belong to"));
    }
}
