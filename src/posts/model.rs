//! Post records and the payload shapes cached for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post row as returned by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub image: Option<String>,
    pub category_id: i64,
    pub category_slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new post.
///
/// `created_at` defaults to now; setting it backfills an older post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPost {
    pub slug: String,
    pub title: String,
    pub content: String,
    pub author: String,
    pub image: Option<String>,
    pub category_id: i64,
    pub category_slug: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Partial update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostUpdate {
    pub slug: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
    pub image: Option<String>,
    pub category_id: Option<i64>,
    pub category_slug: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(u64::from(limit))
        };
        Self {
            page,
            limit,
            total,
            total_pages,
        }
    }
}

/// One page of a post listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub pagination: Pagination,
}

/// A post together with up to three others from its category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletePost {
    pub post: Post,
    pub related_posts: Vec<Post>,
}

/// Every payload shape held in the post cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CachedValue {
    Post(Post),
    Posts(Vec<Post>),
    Page(PostPage),
    Complete(CompletePost),
}

impl CachedValue {
    pub fn into_post(self) -> Option<Post> {
        match self {
            Self::Post(post) => Some(post),
            _ => None,
        }
    }

    pub fn into_posts(self) -> Option<Vec<Post>> {
        match self {
            Self::Posts(posts) => Some(posts),
            _ => None,
        }
    }

    pub fn into_page(self) -> Option<PostPage> {
        match self {
            Self::Page(page) => Some(page),
            _ => None,
        }
    }

    pub fn into_complete(self) -> Option<CompletePost> {
        match self {
            Self::Complete(complete) => Some(complete),
            _ => None,
        }
    }
}
