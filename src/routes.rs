// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::{get, patch, post, put},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    config::MAX_UPLOAD_BYTES,
    handlers::{auth, community, interaction, profile, uploads},
    state::AppState,
};

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(e) => {
            tracing::warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
            cors
        }
    }
}

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, posts, users, images).
/// * Serves stored images under `/uploads`.
/// * Applies global middleware (Trace, CORS).
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/check", get(auth::check));

    let post_routes = Router::new()
        .route("/", get(community::list_posts).post(community::create_post))
        .route(
            "/{id}",
            get(community::get_post)
                .put(community::edit_post)
                .delete(community::delete_post),
        )
        .route(
            "/{id}/comments",
            get(interaction::list_comments).post(interaction::create_comment),
        )
        .route(
            "/{id}/comments/{comment_id}",
            put(interaction::edit_comment).delete(interaction::delete_comment),
        )
        .route(
            "/{id}/likes",
            post(interaction::like_post).delete(interaction::unlike_post),
        );

    let user_routes = Router::new()
        .route("/check-email", post(profile::check_email))
        .route("/check-nickname", post(profile::check_nickname))
        .route(
            "/{id}/profile",
            get(profile::get_profile).put(profile::edit_profile),
        )
        .route("/{id}/password", patch(profile::change_password))
        .route("/{id}", axum::routing::delete(profile::delete_account));

    let image_routes = Router::new()
        .route("/", post(uploads::upload_image))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let cors = cors_layer(&state.config.cors_origin);
    let upload_dir = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .nest("/auth", auth_routes)
        .nest("/posts", post_routes)
        .nest("/users", user_routes)
        .nest("/images", image_routes)
        .nest_service("/uploads", upload_dir)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
