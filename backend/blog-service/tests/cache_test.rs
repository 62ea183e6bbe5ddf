//! Index page caching
#[macro_use]
mod common;

use actix_web::test;
use blog_service::db::Repository;
use common::{post_ids, TestEnv};

#[actix_web::test]
async fn test_index_is_served_from_cache_until_cleared() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    let post = env.post(&author, None, "Cached post").await;

    let app = init_app!(env);
    let first = html_ok!(&app, test::TestRequest::get().uri("/").to_request());
    assert!(first.contains("Cached post"));

    env.repo.delete_post(post.id).await.unwrap();

    let second = html_ok!(&app, test::TestRequest::get().uri("/").to_request());
    assert_eq!(first, second);

    env.clear_cache().await;
    let third = html_ok!(&app, test::TestRequest::get().uri("/").to_request());
    assert!(!third.contains("Cached post"));
    assert!(post_ids(&third).is_empty());
}

#[actix_web::test]
async fn test_cache_is_per_page_number() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    env.posts(&author, None, 12).await;

    let app = init_app!(env);
    let first = html_ok!(&app, test::TestRequest::get().uri("/").to_request());
    let second = html_ok!(&app, test::TestRequest::get().uri("/?page=2").to_request());
    assert_ne!(post_ids(&first), post_ids(&second));
}

#[actix_web::test]
async fn test_cache_is_per_viewer() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    env.post(&author, None, "Some post").await;

    let app = init_app!(env);
    let guest = html_ok!(&app, test::TestRequest::get().uri("/").to_request());
    let signed_in = html_ok!(
        &app,
        test::TestRequest::get()
            .uri("/")
            .cookie(env.session(&author))
            .to_request(),
    );

    assert!(!guest.contains("/auth/logout/"));
    assert!(signed_in.contains("/auth/logout/"));
}

#[actix_web::test]
async fn test_other_listings_are_not_cached() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    let post = env.post(&author, None, "Uncached post").await;

    let app = init_app!(env);
    let first = html_ok!(&app, test::TestRequest::get().uri("/profile/auth/").to_request());
    assert_eq!(post_ids(&first), vec![post.id]);

    env.repo.delete_post(post.id).await.unwrap();
    let second = html_ok!(&app, test::TestRequest::get().uri("/profile/auth/").to_request());
    assert!(post_ids(&second).is_empty());
}
