// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{
    handlers::{self, auth, comment, fight, post, profile},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Public reads and the auth endpoints are open.
/// * Every mutating route sits behind `auth_middleware`.
/// * Non-API paths serve the client bundle with `index.html` as SPA fallback.
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_origins);
    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/sign-up", post(auth::sign_up))
        .route("/sign-in", post(auth::sign_in));

    let profile_routes = Router::new()
        .route("/{user_id}", get(profile::get_profile))
        .route("/{user_id}/posts", get(profile::list_user_posts))
        .route("/{user_id}/fights", get(profile::list_user_fights))
        // Protected profile routes
        .merge(
            Router::new()
                .route("/{user_id}", put(profile::update_profile))
                .layer(require_auth.clone()),
        );

    let post_routes = Router::new()
        .route("/", get(post::list_posts))
        .route("/{post_id}", get(post::get_post))
        .route("/{post_id}/comments", get(comment::list_comments))
        // Protected post routes
        .merge(
            Router::new()
                .route("/", post(post::create_post))
                .route("/{post_id}", put(post::update_post).delete(post::delete_post))
                .route("/{post_id}/comments", post(comment::create_comment))
                .layer(require_auth.clone()),
        );

    let comment_routes = Router::new()
        .route("/{comment_id}", delete(comment::delete_comment))
        .layer(require_auth.clone());

    let fight_routes = Router::new()
        .route("/", get(fight::list_fights))
        .route("/{fight_id}", get(fight::get_fight))
        // Protected fight routes
        .merge(
            Router::new()
                .route("/", post(fight::create_fight))
                .route("/{fight_id}", put(fight::update_fight).delete(fight::delete_fight))
                .layer(require_auth),
        );

    let api_routes = Router::new()
        .route("/hello", get(handlers::hello))
        .route("/search", get(profile::search_users))
        .nest("/auth", auth_routes)
        .nest("/profile", profile_routes)
        .nest("/posts", post_routes)
        .nest("/comments", comment_routes)
        .nest("/fights", fight_routes)
        .fallback(handlers::api_not_found);

    let dist = &state.config.client_dist_dir;
    let client = ServeDir::new(dist).fallback(ServeFile::new(format!("{}/index.html", dist)));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(client)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// `*` anywhere in the list opens CORS to every origin; otherwise only the
/// listed origins are allowed.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
