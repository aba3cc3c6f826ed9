//! API Routes
//!
//! Configures the Axum router with all post and cache endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    cache_stats_handler, clear_cache_handler, create_post_handler, delete_post_handler,
    get_complete_post_handler, get_post_by_id_handler, get_post_handler, health_handler,
    list_posts_handler, trending_handler, update_post_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// `/posts/:post` carries a slug for GET and a numeric id for PUT and
/// DELETE; the router needs one parameter name per position.
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/posts", get(list_posts_handler).post(create_post_handler))
        .route("/posts/trending", get(trending_handler))
        .route("/posts/id/:id", get(get_post_by_id_handler))
        .route(
            "/posts/:post",
            get(get_post_handler)
                .put(update_post_handler)
                .delete(delete_post_handler),
        )
        .route("/posts/:post/complete", get(get_complete_post_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache/clear", post(clear_cache_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheLimits, CacheStore};
    use crate::posts::{CachedPosts, InMemoryPostRepository, ReadThroughOptions};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::sync::Arc;
    use tokio::sync::RwLock;
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let cache = Arc::new(RwLock::new(CacheStore::new(CacheLimits::default())));
        let posts = CachedPosts::new(
            Arc::new(InMemoryPostRepository::new()),
            cache,
            ReadThroughOptions::default(),
        );
        create_router(AppState::new(posts))
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/cache/stats")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_trending_is_not_a_slug() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/posts/trending")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/posts/nonexistent")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
