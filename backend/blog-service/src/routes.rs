/// URL dispatch
use crate::error::AppError;
use crate::handlers::{auth, comments, follow, health, media, posts};
use crate::middleware::CachePage;
use crate::state::AppState;
use actix_web::web;

/// Register every route. Call once per worker, inside the app factory.
pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let index_cache = CachePage::new(
        state.page_cache.clone(),
        &state.config.cache.index_key_prefix,
        state.index_cache_ttl(),
    );

    cfg.app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    // `/posts/abc/` is a missing page, not a malformed request
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::not_found(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health))
    .route("/metrics", web::get().to(health::serve_metrics))
    .service(
        web::resource("/")
            .wrap(index_cache)
            .route(web::get().to(posts::index))
            .route(web::head().to(posts::index)),
    )
    .route("/group/{slug}/", web::get().to(posts::group_posts))
    .route("/profile/{username}/", web::get().to(posts::profile))
    .service(
        web::resource("/profile/{username}/follow/")
            .route(web::get().to(follow::profile_follow))
            .route(web::post().to(follow::profile_follow)),
    )
    .service(
        web::resource("/profile/{username}/unfollow/")
            .route(web::get().to(follow::profile_unfollow))
            .route(web::post().to(follow::profile_unfollow)),
    )
    .route("/follow/", web::get().to(follow::follow_index))
    .service(
        web::resource("/create/")
            .route(web::get().to(posts::post_create_form))
            .route(web::post().to(posts::post_create)),
    )
    .route("/posts/{post_id}/", web::get().to(posts::post_detail))
    .service(
        web::resource("/posts/{post_id}/edit/")
            .route(web::get().to(posts::post_edit_form))
            .route(web::post().to(posts::post_edit)),
    )
    .service(
        web::resource("/posts/{post_id}/comment/")
            .route(web::post().to(comments::add_comment))
            .route(web::get().to(comments::add_comment_get)),
    )
    .service(
        web::resource("/auth/signup/")
            .route(web::get().to(auth::signup_form))
            .route(web::post().to(auth::signup)),
    )
    .service(
        web::resource("/auth/login/")
            .route(web::get().to(auth::login_form))
            .route(web::post().to(auth::login)),
    )
    .service(
        web::resource("/auth/logout/")
            .route(web::get().to(auth::logout))
            .route(web::post().to(auth::logout)),
    )
    .route("/media/{path:.*}", web::get().to(media::serve_media))
    .default_service(web::to(health::not_found));
}
