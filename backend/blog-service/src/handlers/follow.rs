/// Subscription handlers
use super::{page_param, profile_url, redirect};
use crate::error::{AppError, Result};
use crate::middleware::LoginRequired;
use crate::models::{PostFilter, User};
use crate::pagination::paginate_posts;
use crate::state::AppState;
use crate::views;
use actix_web::{web, HttpRequest, HttpResponse};

/// Posts by every author the viewer follows
pub async fn follow_index(
    state: web::Data<AppState>,
    user: LoginRequired,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let page = paginate_posts(
        state.repo.as_ref(),
        PostFilter::FollowedBy(user.0.id),
        page_param(&req).as_deref(),
    )
    .await?;

    Ok(views::ok(views::posts::follow_page(&page, Some(&user.0))))
}

/// Subscribe to an author. Following yourself does nothing.
pub async fn profile_follow(
    state: web::Data<AppState>,
    user: LoginRequired,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let author = find_author(&state, &username).await?;
    if author.id == user.0.id {
        return Ok(redirect(&profile_url(&author.username)));
    }

    let created = state.repo.follow(user.0.id, author.id).await?;
    tracing::info!(
        user_id = user.0.id,
        author_id = author.id,
        created = created,
        "Followed author"
    );
    Ok(redirect("/follow/"))
}

/// Unsubscribe from an author, if subscribed
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    user: LoginRequired,
    username: web::Path<String>,
) -> Result<HttpResponse> {
    let author = find_author(&state, &username).await?;

    let removed = state.repo.unfollow(user.0.id, author.id).await?;
    tracing::info!(
        user_id = user.0.id,
        author_id = author.id,
        removed = removed,
        "Unfollowed author"
    );
    Ok(redirect(&profile_url(&author.username)))
}

async fn find_author(state: &AppState, username: &str) -> Result<User> {
    state
        .repo
        .find_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", username)))
}
