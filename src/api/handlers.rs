//! API Handlers
//!
//! HTTP request handlers for the post and cache endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::cache::CacheStats;
use crate::error::{ApiError, Result};
use crate::models::{
    ClearResponse, CreatePostRequest, DeleteResponse, HealthResponse, ListQuery, TrendingQuery,
    UpdatePostRequest,
};
use crate::posts::{CachedPosts, CompletePost, Post, PostPage};

/// Application state shared across all handlers.
///
/// Holds the cache-backed post layer; the cache store itself is reached
/// through it so every handler sees the same instance.
#[derive(Clone)]
pub struct AppState {
    pub posts: Arc<CachedPosts>,
}

impl AppState {
    pub fn new(posts: CachedPosts) -> Self {
        Self {
            posts: Arc::new(posts),
        }
    }
}

/// Handler for GET /posts
///
/// Lists posts newest first, optionally scoped to a category.
pub async fn list_posts_handler(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PostPage>> {
    let (page, limit) = query.resolve().map_err(ApiError::InvalidRequest)?;

    let listing = match query.category.as_deref() {
        Some(category) => state.posts.list_by_category(category, page, limit).await?,
        None => state.posts.list(page, limit).await?,
    };
    Ok(Json(listing))
}

/// Handler for GET /posts/trending
pub async fn trending_handler(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> Result<Json<Vec<Post>>> {
    let count = query.resolve().map_err(ApiError::InvalidRequest)?;
    Ok(Json(state.posts.trending(count).await?))
}

/// Handler for GET /posts/:slug
pub async fn get_post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Post>> {
    state
        .posts
        .by_slug(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("post '{slug}'")))
}

/// Handler for GET /posts/:slug/complete
///
/// Returns the post with related posts from its category.
pub async fn get_complete_post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CompletePost>> {
    state
        .posts
        .complete(&slug)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("post '{slug}'")))
}

/// Handler for GET /posts/id/:id
pub async fn get_post_by_id_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Post>> {
    state
        .posts
        .by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("post {id}")))
}

/// Handler for POST /posts
pub async fn create_post_handler(
    State(state): State<AppState>,
    Json(req): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>)> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let post = state.posts.create(req.into_new_post()).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Handler for PUT /posts/:id
pub async fn update_post_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePostRequest>,
) -> Result<Json<Post>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    Ok(Json(state.posts.update(id, req.into_update()).await?))
}

/// Handler for DELETE /posts/:id
pub async fn delete_post_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>> {
    let removed = state.posts.delete(id).await?;
    Ok(Json(DeleteResponse::new(removed.id, &removed.slug)))
}

/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<CacheStats> {
    let cache = state.posts.cache();
    let stats = cache.read().await.stats();
    Json(stats)
}

/// Handler for POST /cache/clear
pub async fn clear_cache_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let cache = state.posts.cache();
    let cleared = {
        let mut guard = cache.write().await;
        let cleared = guard.len();
        guard.clear();
        cleared
    };

    info!(cleared, "cache cleared on request");
    Json(ClearResponse::new(cleared))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheLimits, CacheStore};
    use crate::posts::{InMemoryPostRepository, ReadThroughOptions};
    use tokio::sync::RwLock;

    fn test_state() -> AppState {
        let cache = Arc::new(RwLock::new(CacheStore::new(CacheLimits::default())));
        AppState::new(CachedPosts::new(
            Arc::new(InMemoryPostRepository::new()),
            cache,
            ReadThroughOptions::default(),
        ))
    }

    fn create_request(slug: &str) -> CreatePostRequest {
        CreatePostRequest {
            slug: slug.to_string(),
            title: "Title".to_string(),
            content: "Body".to_string(),
            author: "editor".to_string(),
            image: None,
            category_id: 1,
            category_slug: "tech".to_string(),
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_handler() {
        let state = test_state();

        let (status, created) =
            create_post_handler(State(state.clone()), Json(create_request("hello")))
                .await
                .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let fetched = get_post_handler(State(state.clone()), Path("hello".to_string()))
            .await
            .unwrap();
        assert_eq!(fetched.id, created.id);

        let by_id = get_post_by_id_handler(State(state), Path(created.id))
            .await
            .unwrap();
        assert_eq!(by_id.slug, "hello");
    }

    #[tokio::test]
    async fn test_get_nonexistent_post() {
        let state = test_state();

        let result = get_post_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_invalid_request() {
        let state = test_state();

        let result = create_post_handler(State(state), Json(create_request(""))).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        let (_, created) = create_post_handler(State(state.clone()), Json(create_request("bye")))
            .await
            .unwrap();

        let response = delete_post_handler(State(state.clone()), Path(created.id))
            .await
            .unwrap();
        assert_eq!(response.id, created.id);

        let result = get_post_handler(State(state), Path("bye".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stats_and_clear_handlers() {
        let state = test_state();
        create_post_handler(State(state.clone()), Json(create_request("hello")))
            .await
            .unwrap();
        get_post_handler(State(state.clone()), Path("hello".to_string()))
            .await
            .unwrap();

        let stats = cache_stats_handler(State(state.clone())).await;
        assert_eq!(stats.counters.misses, 1);
        assert_eq!(stats.total_items, 2);

        let cleared = clear_cache_handler(State(state.clone())).await;
        assert_eq!(cleared.cleared, 2);

        let stats = cache_stats_handler(State(state)).await;
        assert_eq!(stats.total_items, 0);
        assert_eq!(stats.counters.misses, 1, "clear keeps counters");
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
