//! Request DTOs for the post API
//!
//! Defines the structure of incoming query strings and request bodies.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::posts::{NewPost, PostUpdate};

/// Largest page size a listing request may ask for
pub const MAX_PAGE_LIMIT: u32 = 100;

/// Default page size for listings
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Default size of the trending set
pub const DEFAULT_TRENDING_COUNT: u32 = 5;

/// Maximum slug length in characters
pub const MAX_SLUG_LENGTH: usize = 200;

/// Query string for `GET /posts`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
}

impl ListQuery {
    /// Returns `(page, limit)` with defaults applied, or a validation message.
    pub fn resolve(&self) -> Result<(u32, u32), String> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page == 0 {
            return Err("page starts at 1".to_string());
        }
        if limit == 0 || limit > MAX_PAGE_LIMIT {
            return Err(format!("limit must be between 1 and {MAX_PAGE_LIMIT}"));
        }
        Ok((page, limit))
    }
}

/// Query string for `GET /posts/trending`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrendingQuery {
    pub limit: Option<u32>,
}

impl TrendingQuery {
    pub fn resolve(&self) -> Result<u32, String> {
        match self.limit.unwrap_or(DEFAULT_TRENDING_COUNT) {
            0 => Err("limit must be at least 1".to_string()),
            n if n > MAX_PAGE_LIMIT => Err(format!("limit must not exceed {MAX_PAGE_LIMIT}")),
            n => Ok(n),
        }
    }
}

fn validate_slug(slug: &str) -> Option<String> {
    if slug.is_empty() {
        return Some("slug cannot be empty".to_string());
    }
    if slug.len() > MAX_SLUG_LENGTH {
        return Some(format!("slug exceeds maximum length of {MAX_SLUG_LENGTH} characters"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Some("slug may only contain lowercase letters, digits and '-'".to_string());
    }
    None
}

/// Request body for `POST /posts`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostRequest {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub author: String,
    #[serde(default)]
    pub image: Option<String>,
    pub category_id: i64,
    pub category_slug: String,
    /// Backdates the post; defaults to now
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl CreatePostRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(msg) = validate_slug(&self.slug) {
            return Some(msg);
        }
        if self.title.trim().is_empty() {
            return Some("title cannot be empty".to_string());
        }
        if let Some(msg) = validate_slug(&self.category_slug) {
            return Some(format!("category_slug: {msg}"));
        }
        None
    }

    pub fn into_new_post(self) -> NewPost {
        NewPost {
            slug: self.slug,
            title: self.title,
            content: self.content,
            author: self.author,
            image: self.image,
            category_id: self.category_id,
            category_slug: self.category_slug,
            created_at: self.created_at,
        }
    }
}

/// Request body for `PUT /posts/:id`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostRequest {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub category_slug: Option<String>,
}

impl UpdatePostRequest {
    pub fn validate(&self) -> Option<String> {
        if let Some(msg) = self.slug.as_deref().and_then(validate_slug) {
            return Some(msg);
        }
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Some("title cannot be empty".to_string());
        }
        if let Some(msg) = self.category_slug.as_deref().and_then(validate_slug) {
            return Some(format!("category_slug: {msg}"));
        }
        None
    }

    pub fn into_update(self) -> PostUpdate {
        PostUpdate {
            slug: self.slug,
            title: self.title,
            content: self.content,
            author: self.author,
            image: self.image,
            category_id: self.category_id,
            category_slug: self.category_slug,
        }
    }
}
