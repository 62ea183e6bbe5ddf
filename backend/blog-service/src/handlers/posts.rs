/// Post handlers - listings, detail, create and edit
use super::{page_param, post_url, profile_url, redirect};
use crate::error::{AppError, Result};
use crate::forms::{validate_form, FormErrors, PostForm, INVALID_CHOICE, INVALID_IMAGE};
use crate::media::{MediaError, MediaStore};
use crate::middleware::{LoginRequired, Viewer};
use crate::models::{NewPost, PostChanges, PostFilter, PostView};
use crate::pagination::paginate_posts;
use crate::state::AppState;
use crate::views::{self, posts::FollowButton};
use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse};
use image::ImageFormat;

/// Index: every post, newest first
pub async fn index(
    state: web::Data<AppState>,
    viewer: Viewer,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let page = paginate_posts(
        state.repo.as_ref(),
        PostFilter::All,
        page_param(&req).as_deref(),
    )
    .await?;

    Ok(views::ok(views::posts::index_page(&page, viewer.user())))
}

/// Posts of one group
pub async fn group_posts(
    state: web::Data<AppState>,
    viewer: Viewer,
    slug: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let group = state
        .repo
        .find_group_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::not_found(format!("group {}", slug)))?;

    let page = paginate_posts(
        state.repo.as_ref(),
        PostFilter::Group(group.id),
        page_param(&req).as_deref(),
    )
    .await?;

    Ok(views::ok(views::posts::group_page(
        &group,
        &page,
        viewer.user(),
    )))
}

/// Posts of one author, with the follow button for signed-in viewers
pub async fn profile(
    state: web::Data<AppState>,
    viewer: Viewer,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let author = state
        .repo
        .find_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", username)))?;

    let page = paginate_posts(
        state.repo.as_ref(),
        PostFilter::Author(author.id),
        page_param(&req).as_deref(),
    )
    .await?;

    let button = match viewer.user() {
        None => FollowButton::Hidden,
        Some(user) if user.id == author.id => FollowButton::Hidden,
        Some(user) => {
            if state.repo.is_following(user.id, author.id).await? {
                FollowButton::Unfollow
            } else {
                FollowButton::Follow
            }
        }
    };
    let followers = state.repo.count_followers(author.id).await?;

    Ok(views::ok(views::posts::profile_page(
        &author,
        &page,
        followers,
        button,
        viewer.user(),
    )))
}

/// One post with its comments
pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: Viewer,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    let post = find_post(&state, post_id).await?;
    let comments = state.repo.list_comments(post_id).await?;
    let author_posts = state
        .repo
        .count_posts(PostFilter::Author(post.author_id))
        .await?;

    Ok(views::ok(views::posts::post_detail_page(
        &post,
        &comments,
        author_posts,
        viewer.user(),
    )))
}

pub async fn post_create_form(
    state: web::Data<AppState>,
    user: LoginRequired,
) -> Result<HttpResponse> {
    render_form(&state, &PostForm::default(), &FormErrors::new(), None, &user).await
}

pub async fn post_create(
    state: web::Data<AppState>,
    user: LoginRequired,
    payload: Multipart,
) -> Result<HttpResponse> {
    let form = PostForm::from_multipart(payload, state.config.media.max_upload_bytes).await?;

    let cleaned = match clean_post_form(&state, &form).await? {
        Ok(cleaned) => cleaned,
        Err(errors) => return render_form(&state, &form, &errors, None, &user).await,
    };

    let image = match cleaned.image {
        Some((format, bytes)) => Some(state.media.save(format, &bytes).await?),
        None => None,
    };

    let post = match state
        .repo
        .create_post(NewPost {
            author_id: user.0.id,
            text: form.text.trim().to_string(),
            group_id: cleaned.group_id,
            image: image.clone(),
        })
        .await
    {
        Ok(post) => post,
        Err(e) => {
            discard_upload(&state, image.as_deref()).await;
            return Err(e.into());
        }
    };

    tracing::info!(post_id = post.id, user_id = user.0.id, "Post created");
    Ok(redirect(&profile_url(&user.0.username)))
}

pub async fn post_edit_form(
    state: web::Data<AppState>,
    user: LoginRequired,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post = find_own_post(&state, post_id.into_inner(), &user).await?;
    let form = PostForm::initial(&post.text, post.group_id);
    render_form(&state, &form, &FormErrors::new(), Some(&post), &user).await
}

pub async fn post_edit(
    state: web::Data<AppState>,
    user: LoginRequired,
    post_id: web::Path<i64>,
    payload: Multipart,
) -> Result<HttpResponse> {
    let post = find_own_post(&state, post_id.into_inner(), &user).await?;
    let form = PostForm::from_multipart(payload, state.config.media.max_upload_bytes).await?;

    let cleaned = match clean_post_form(&state, &form).await? {
        Ok(cleaned) => cleaned,
        Err(errors) => return render_form(&state, &form, &errors, Some(&post), &user).await,
    };

    let uploaded = match cleaned.image {
        Some((format, bytes)) => Some(state.media.save(format, &bytes).await?),
        None => None,
    };
    let image = match &uploaded {
        Some(path) => Some(path.clone()),
        None if form.clear_image => None,
        None => post.image.clone(),
    };

    let updated = state
        .repo
        .update_post(
            post.id,
            PostChanges {
                text: form.text.trim().to_string(),
                group_id: cleaned.group_id,
                image: image.clone(),
            },
        )
        .await
        .map_err(AppError::from)
        .and_then(|row| row.ok_or_else(|| AppError::not_found(format!("post {}", post.id))));
    if let Err(e) = updated {
        discard_upload(&state, uploaded.as_deref()).await;
        return Err(e);
    }

    if let Some(old) = post.image.as_deref().filter(|old| image.as_deref() != Some(*old)) {
        if let Err(e) = state.media.remove(old).await {
            tracing::warn!(post_id = post.id, path = %old, error = %e, "Failed to remove replaced image");
        }
    }

    tracing::info!(post_id = post.id, user_id = user.0.id, "Post updated");
    Ok(redirect(&post_url(post.id)))
}

/// Remove a file saved for a write that did not go through
async fn discard_upload(state: &AppState, path: Option<&str>) {
    let Some(path) = path else {
        return;
    };
    if let Err(e) = state.media.remove(path).await {
        tracing::warn!(path = %path, error = %e, "Failed to remove orphaned upload");
    }
}

async fn find_post(state: &AppState, post_id: i64) -> Result<PostView> {
    state
        .repo
        .find_post(post_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
}

/// The post, if it exists and belongs to the viewer; 404 otherwise
async fn find_own_post(state: &AppState, post_id: i64, user: &LoginRequired) -> Result<PostView> {
    let post = find_post(state, post_id).await?;
    if post.author_id != user.0.id {
        return Err(AppError::not_found(format!(
            "post {} of user {}",
            post_id, user.0.id
        )));
    }
    Ok(post)
}

/// Validated post form values
struct CleanedPost {
    group_id: Option<i64>,
    image: Option<(ImageFormat, Vec<u8>)>,
}

/// Validate every field; the outer error is a failure, the inner one a form error
async fn clean_post_form(
    state: &AppState,
    form: &PostForm,
) -> Result<std::result::Result<CleanedPost, FormErrors>> {
    let mut errors = validate_form(form);

    let group_id = match form.group_id() {
        Ok(None) => None,
        Ok(Some(id)) => {
            if state.repo.find_group_by_id(id).await?.is_none() {
                errors.add("group", INVALID_CHOICE);
            }
            Some(id)
        }
        Err(_) => {
            errors.add("group", INVALID_CHOICE);
            None
        }
    };

    let image = match &form.image {
        None => None,
        Some(upload) => match MediaStore::inspect(upload.bytes.clone()).await {
            Ok(inspected) => Some(inspected),
            Err(MediaError::InvalidImage(reason)) => {
                tracing::debug!(reason = %reason, "Rejected upload");
                errors.add("image", INVALID_IMAGE);
                None
            }
            Err(e) => return Err(e.into()),
        },
    };

    if !errors.is_empty() {
        return Ok(Err(errors));
    }
    Ok(Ok(CleanedPost { group_id, image }))
}

async fn render_form(
    state: &AppState,
    form: &PostForm,
    errors: &FormErrors,
    post: Option<&PostView>,
    user: &LoginRequired,
) -> Result<HttpResponse> {
    let groups = state.repo.list_groups().await?;
    Ok(views::ok(views::posts::post_form_page(
        form,
        errors,
        &groups,
        post,
        Some(&user.0),
    )))
}
