//! Record store seam for posts.
//!
//! The production store is SQL-backed and lives outside this crate; the
//! in-memory implementation here backs the binary and the tests.

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::posts::{NewPost, Pagination, Post, PostPage, PostUpdate};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("post not found")]
    NotFound,
    #[error("a post with slug `{slug}` already exists")]
    Duplicate { slug: String },
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Fetch and write operations the cache layer needs from the record store.
///
/// Listing pages are 1-based and ordered newest first.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError>;
    async fn list(&self, page: u32, limit: u32) -> Result<PostPage, RepoError>;
    async fn trending(&self, limit: u32) -> Result<Vec<Post>, RepoError>;
    async fn list_by_category(
        &self,
        category_slug: &str,
        page: u32,
        limit: u32,
    ) -> Result<PostPage, RepoError>;
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;
    async fn update(&self, id: i64, update: PostUpdate) -> Result<Post, RepoError>;
    /// Removes the post and returns the removed row.
    async fn delete(&self, id: i64) -> Result<Post, RepoError>;
}

// == In-Memory Repository ==

#[derive(Debug, Default)]
struct Rows {
    posts: Vec<Post>,
    next_id: i64,
}

impl Rows {
    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.posts
            .iter()
            .any(|post| post.slug == slug && Some(post.id) != except)
    }

    /// Rows matching `filter`, newest first.
    fn newest_first<'a>(&'a self, filter: impl Fn(&Post) -> bool) -> Vec<&'a Post> {
        let mut rows: Vec<&Post> = self.posts.iter().filter(|post| filter(post)).collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows
    }
}

fn paginate(rows: Vec<&Post>, page: u32, limit: u32) -> PostPage {
    let page = page.max(1);
    let offset = (page as usize - 1).saturating_mul(limit as usize);
    let posts = rows
        .iter()
        .skip(offset)
        .take(limit as usize)
        .map(|post| (*post).clone())
        .collect();

    PostPage {
        posts,
        pagination: Pagination::new(page, limit, rows.len() as u64),
    }
}

/// Vec-backed post store.
#[derive(Debug, Default)]
pub struct InMemoryPostRepository {
    rows: RwLock<Rows>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.posts.iter().find(|post| post.slug == slug).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows.posts.iter().find(|post| post.id == id).cloned())
    }

    async fn list(&self, page: u32, limit: u32) -> Result<PostPage, RepoError> {
        let rows = self.rows.read().await;
        Ok(paginate(rows.newest_first(|_| true), page, limit))
    }

    async fn trending(&self, limit: u32) -> Result<Vec<Post>, RepoError> {
        let rows = self.rows.read().await;
        Ok(rows
            .newest_first(|_| true)
            .into_iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn list_by_category(
        &self,
        category_slug: &str,
        page: u32,
        limit: u32,
    ) -> Result<PostPage, RepoError> {
        let rows = self.rows.read().await;
        let matching = rows.newest_first(|post| post.category_slug == category_slug);
        Ok(paginate(matching, page, limit))
    }

    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut rows = self.rows.write().await;
        if rows.slug_taken(&post.slug, None) {
            return Err(RepoError::Duplicate { slug: post.slug });
        }

        rows.next_id += 1;
        let now = Utc::now();
        let created = Post {
            id: rows.next_id,
            slug: post.slug,
            title: post.title,
            content: post.content,
            author: post.author,
            image: post.image,
            category_id: post.category_id,
            category_slug: post.category_slug,
            created_at: post.created_at.unwrap_or(now),
            updated_at: now,
        };
        rows.posts.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: i64, update: PostUpdate) -> Result<Post, RepoError> {
        let mut rows = self.rows.write().await;
        if let Some(slug) = &update.slug {
            if rows.slug_taken(slug, Some(id)) {
                return Err(RepoError::Duplicate { slug: slug.clone() });
            }
        }

        let post = rows
            .posts
            .iter_mut()
            .find(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;

        if let Some(slug) = update.slug {
            post.slug = slug;
        }
        if let Some(title) = update.title {
            post.title = title;
        }
        if let Some(content) = update.content {
            post.content = content;
        }
        if let Some(author) = update.author {
            post.author = author;
        }
        if let Some(image) = update.image {
            post.image = Some(image);
        }
        if let Some(category_id) = update.category_id {
            post.category_id = category_id;
        }
        if let Some(category_slug) = update.category_slug {
            post.category_slug = category_slug;
        }
        post.updated_at = Utc::now();

        Ok(post.clone())
    }

    async fn delete(&self, id: i64) -> Result<Post, RepoError> {
        let mut rows = self.rows.write().await;
        let index = rows
            .posts
            .iter()
            .position(|post| post.id == id)
            .ok_or(RepoError::NotFound)?;
        Ok(rows.posts.remove(index))
    }
}
