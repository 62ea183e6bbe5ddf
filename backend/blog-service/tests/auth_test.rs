//! Signup, login and logout
#[macro_use]
mod common;

use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test;
use blog_service::db::Repository;
use blog_service::forms::{BAD_CREDENTIALS, PASSWORD_MISMATCH, USERNAME_TAKEN};
use blog_service::models::User;
use blog_service::security::hash_password;
use common::{location, TestEnv};

const PASSWORD: &str = "correct-horse-battery";

fn session_cookie(resp: &ServiceResponse) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == "blog_session")
        .map(|c| c.into_owned())
}

async fn user_with_password(env: &TestEnv, username: &str) -> User {
    let hash = hash_password(PASSWORD).unwrap();
    env.repo.create_user(username, &hash).await.unwrap()
}

#[actix_web::test]
async fn test_signup_creates_user_and_signs_in() {
    let env = TestEnv::new();
    let app = init_app!(env);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form([
                ("username", "newbie"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ])
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let cookie = session_cookie(&resp).expect("session cookie");

    let user = env
        .repo
        .find_user_by_username("newbie")
        .await
        .unwrap()
        .expect("user created");
    assert_ne!(user.password_hash, PASSWORD);

    // The new session reaches private pages
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_signup_rejects_taken_username_and_mismatch() {
    let env = TestEnv::new();
    env.user("taken").await;
    let app = init_app!(env);

    let html = html_ok!(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form([
                ("username", "taken"),
                ("password1", PASSWORD),
                ("password2", PASSWORD),
            ])
            .to_request(),
    );
    assert!(html.contains(USERNAME_TAKEN));

    let html = html_ok!(
        &app,
        test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form([
                ("username", "fresh"),
                ("password1", PASSWORD),
                ("password2", "something-else"),
            ])
            .to_request(),
    );
    assert!(html.contains(&blog_service::views::escape(PASSWORD_MISMATCH)));
    assert!(env
        .repo
        .find_user_by_username("fresh")
        .await
        .unwrap()
        .is_none());
}

#[actix_web::test]
async fn test_login_with_bad_credentials() {
    let env = TestEnv::new();
    user_with_password(&env, "auth").await;
    let app = init_app!(env);

    for (username, password) in [("auth", "wrong-password"), ("nobody", PASSWORD)] {
        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .set_form([("username", username), ("password", password)])
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(session_cookie(&resp).is_none());

        let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
        assert!(html.contains(BAD_CREDENTIALS), "{}", username);
    }
}

#[actix_web::test]
async fn test_login_follows_next() {
    let env = TestEnv::new();
    user_with_password(&env, "auth").await;
    let app = init_app!(env);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_form([
                ("username", "auth"),
                ("password", PASSWORD),
                ("next", "/follow/"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/follow/");
    assert!(session_cookie(&resp).is_some());

    // Off-site targets fall back to the index
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/auth/login/")
            .set_form([
                ("username", "auth"),
                ("password", PASSWORD),
                ("next", "//evil.example/"),
            ])
            .to_request(),
    )
    .await;
    assert_eq!(location(&resp), "/");
}

#[actix_web::test]
async fn test_login_form_keeps_next() {
    let env = TestEnv::new();
    let app = init_app!(env);

    let html = html_ok!(
        &app,
        test::TestRequest::get()
            .uri("/auth/login/?next=/create/")
            .to_request(),
    );
    assert!(html.contains(r#"name="next" value="/create/""#));
}

#[actix_web::test]
async fn test_logout_removes_session() {
    let env = TestEnv::new();
    let user = env.user("auth").await;
    let app = init_app!(env);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/auth/logout/")
            .cookie(env.session(&user))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/");
    let cookie = session_cookie(&resp).expect("removal cookie");
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
}

#[actix_web::test]
async fn test_tampered_session_is_anonymous() {
    let env = TestEnv::new();
    let app = init_app!(env);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/create/")
            .cookie(Cookie::new("blog_session", "not.a.jwt"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), "/auth/login/?next=/create/");
}
