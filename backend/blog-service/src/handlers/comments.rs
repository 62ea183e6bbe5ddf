/// Comment handlers
use super::{post_url, redirect};
use crate::error::{AppError, Result};
use crate::forms::{validate_form, CommentForm};
use crate::middleware::LoginRequired;
use crate::models::NewComment;
use crate::state::AppState;
use actix_web::{web, HttpResponse};

/// Save a comment if the form is valid; always go back to the post
pub async fn add_comment(
    state: web::Data<AppState>,
    user: LoginRequired,
    post_id: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    ensure_post(&state, post_id).await?;

    let form = form.into_inner();
    if validate_form(&form).is_empty() {
        let comment = state
            .repo
            .create_comment(NewComment {
                post_id,
                author_id: user.0.id,
                text: form.text.trim().to_string(),
            })
            .await?;
        tracing::info!(
            post_id = post_id,
            comment_id = comment.id,
            user_id = user.0.id,
            "Comment added"
        );
    }

    Ok(redirect(&post_url(post_id)))
}

/// GET on the comment URL has no form to save
pub async fn add_comment_get(
    state: web::Data<AppState>,
    _user: LoginRequired,
    post_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let post_id = post_id.into_inner();
    ensure_post(&state, post_id).await?;
    Ok(redirect(&post_url(post_id)))
}

async fn ensure_post(state: &AppState, post_id: i64) -> Result<()> {
    state
        .repo
        .find_post(post_id)
        .await?
        .map(|_| ())
        .ok_or_else(|| AppError::not_found(format!("post {}", post_id)))
}
