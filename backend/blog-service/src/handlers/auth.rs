/// Account handlers - signup, login, logout
use super::redirect;
use crate::db::USERS_USERNAME_KEY;
use crate::error::Result;
use crate::forms::{
    safe_next, validate_form, LoginForm, SignupForm, BAD_CREDENTIALS, USERNAME_TAKEN,
};
use crate::middleware::Viewer;
use crate::models::User;
use crate::security::{hash_password, verify_password};
use crate::state::AppState;
use crate::views;
use actix_web::{http::header, web, HttpResponse};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn signup_form() -> Result<HttpResponse> {
    Ok(views::ok(views::auth::signup_page("", &Default::default())))
}

pub async fn signup(
    state: web::Data<AppState>,
    form: web::Form<SignupForm>,
) -> Result<HttpResponse> {
    let form = form.into_inner();
    let mut errors = form.check();

    if !errors.has_field("username")
        && state
            .repo
            .find_user_by_username(&form.username)
            .await?
            .is_some()
    {
        errors.add("username", USERNAME_TAKEN);
    }
    if !errors.is_empty() {
        return Ok(views::ok(views::auth::signup_page(&form.username, &errors)));
    }

    let password_hash = hash_password(&form.password1)?;
    let user = match state.repo.create_user(&form.username, &password_hash).await {
        Ok(user) => user,
        // Lost a race with another signup for the same name
        Err(e) if e.is_unique_violation(USERS_USERNAME_KEY) => {
            errors.add("username", USERNAME_TAKEN);
            return Ok(views::ok(views::auth::signup_page(&form.username, &errors)));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, "User signed up");
    start_session(&state, &user, "/")
}

pub async fn login_form(viewer: Viewer, query: web::Query<NextQuery>) -> Result<HttpResponse> {
    let next = safe_next(query.next.as_deref());
    if viewer.user().is_some() {
        return Ok(redirect(next.unwrap_or("/")));
    }
    Ok(views::ok(views::auth::login_page(
        "",
        next,
        &Default::default(),
    )))
}

pub async fn login(state: web::Data<AppState>, form: web::Form<LoginForm>) -> Result<HttpResponse> {
    let form = form.into_inner();
    let next = safe_next(form.next.as_deref());

    let mut errors = validate_form(&form);
    if errors.is_empty() {
        match state.repo.find_user_by_username(&form.username).await? {
            Some(user) if verify_password(&form.password, &user.password_hash)? => {
                tracing::info!(user_id = user.id, "User logged in");
                return start_session(&state, &user, next.unwrap_or("/"));
            }
            _ => errors.add_non_field(BAD_CREDENTIALS),
        }
    }

    Ok(views::ok(views::auth::login_page(&form.username, next, &errors)))
}

pub async fn logout(state: web::Data<AppState>) -> Result<HttpResponse> {
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(state.sessions.logout_cookie())
        .finish())
}

fn start_session(state: &AppState, user: &User, location: &str) -> Result<HttpResponse> {
    let cookie = state.sessions.login_cookie(user)?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .cookie(cookie)
        .finish())
}
