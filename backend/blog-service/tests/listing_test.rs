//! Listings: index, group, profile and follow feed pagination and content
#[macro_use]
mod common;

use actix_web::test;
use blog_service::db::Repository;
use blog_service::pagination::POSTS_PER_PAGE;
use common::{post_count, post_ids, TestEnv};

const TOTAL_POSTS: usize = 14;

#[actix_web::test]
async fn test_every_listing_paginates_by_ten() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    let reader = env.user("reader").await;
    let group = env.group("Test group", "test_slug").await;
    env.posts(&author, Some(&group), TOTAL_POSTS).await;
    env.repo.follow(reader.id, author.id).await.unwrap();

    let app = init_app!(env);
    let cookie = env.session(&reader);

    for uri in ["/", "/group/test_slug/", "/profile/auth/", "/follow/"] {
        let first = test::TestRequest::get()
            .uri(uri)
            .cookie(cookie.clone())
            .to_request();
        let html = html_ok!(&app, first);
        assert_eq!(post_count(&html), POSTS_PER_PAGE as usize, "page 1 of {}", uri);

        let second = test::TestRequest::get()
            .uri(&format!("{}?page=2", uri))
            .cookie(cookie.clone())
            .to_request();
        let html = html_ok!(&app, second);
        assert_eq!(post_count(&html), 4, "page 2 of {}", uri);
    }
}

#[actix_web::test]
async fn test_index_is_newest_first() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    let posts = env.posts(&author, None, 3).await;

    let app = init_app!(env);
    let html = html_ok!(&app, test::TestRequest::get().uri("/").to_request());

    let expected: Vec<i64> = posts.iter().rev().map(|p| p.id).collect();
    assert_eq!(post_ids(&html), expected);
    assert!(html.contains("Latest updates"));
}

#[actix_web::test]
async fn test_page_number_fallbacks() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    env.posts(&author, None, TOTAL_POSTS).await;

    let app = init_app!(env);
    let cases = [
        ("/profile/auth/?page=abc", 10),
        ("/profile/auth/?page=0", 4),
        ("/profile/auth/?page=99", 4),
        ("/profile/auth/?page=-1", 4),
        ("/profile/auth/?page=99999999999999999999", 4),
    ];
    for (uri, expected) in cases {
        let html = html_ok!(&app, test::TestRequest::get().uri(uri).to_request());
        assert_eq!(post_count(&html), expected, "{}", uri);
    }
}

#[actix_web::test]
async fn test_empty_listing_is_one_empty_page() {
    let env = TestEnv::new();
    env.group("Empty", "empty").await;

    let app = init_app!(env);
    let html = html_ok!(&app,
        test::TestRequest::get().uri("/group/empty/?page=5").to_request(),
    );
    assert_eq!(post_count(&html), 0);
    assert!(!html.contains(r#"class="pagination""#));
}

#[actix_web::test]
async fn test_post_card_shows_text_author_and_group() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    let group = env.group("Test group", "test_slug").await;
    env.post(&author, Some(&group), "Test post body").await;

    let app = init_app!(env);
    let html = html_ok!(&app, test::TestRequest::get().uri("/").to_request());

    assert!(html.contains("Test post body"));
    assert!(html.contains(r#"href="/profile/auth/""#));
    assert!(html.contains(r#"href="/group/test_slug/""#));
}

#[actix_web::test]
async fn test_group_page_only_lists_its_posts() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    let group = env.group("Test group", "test_slug").await;
    let other = env.group("Test group 2", "test_slug2").await;
    let post = env.post(&author, Some(&group), "in first group").await;

    let app = init_app!(env);
    let html = html_ok!(&app,
        test::TestRequest::get().uri("/group/test_slug2/").to_request(),
    );
    assert!(!post_ids(&html).contains(&post.id));
    assert!(html.contains(&other.title));

    let html = html_ok!(&app,
        test::TestRequest::get().uri("/group/test_slug/").to_request(),
    );
    assert_eq!(post_ids(&html), vec![post.id]);
}

#[actix_web::test]
async fn test_post_detail_shows_post_and_comments() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    let reader = env.user("reader").await;
    let post = env.post(&author, None, "Detailed post").await;
    env.repo
        .create_comment(blog_service::models::NewComment {
            post_id: post.id,
            author_id: reader.id,
            text: "First comment".to_string(),
        })
        .await
        .unwrap();

    let app = init_app!(env);
    let html = html_ok!(&app,
        test::TestRequest::get()
            .uri(&format!("/posts/{}/", post.id))
            .to_request(),
    );

    assert_eq!(post_ids(&html), vec![post.id]);
    assert!(html.contains("First comment"));
    assert!(html.contains("<title>Post Detailed post</title>"));
}

#[actix_web::test]
async fn test_profile_follow_button_state() {
    let env = TestEnv::new();
    let author = env.user("auth").await;
    let reader = env.user("reader").await;

    let app = init_app!(env);
    let html = html_ok!(&app,
        test::TestRequest::get()
            .uri("/profile/auth/")
            .cookie(env.session(&reader))
            .to_request(),
    );
    assert!(html.contains(r#"data-following="false""#));

    env.repo.follow(reader.id, author.id).await.unwrap();
    let html = html_ok!(&app,
        test::TestRequest::get()
            .uri("/profile/auth/")
            .cookie(env.session(&reader))
            .to_request(),
    );
    assert!(html.contains(r#"data-following="true""#));

    let own = html_ok!(&app,
        test::TestRequest::get()
            .uri("/profile/auth/")
            .cookie(env.session(&author))
            .to_request(),
    );
    assert!(!own.contains("data-following"));
}
