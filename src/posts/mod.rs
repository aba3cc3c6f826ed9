//! Post data access
//!
//! Record store seam, the cache-backed read path, and the invalidation
//! policy that keeps the two consistent after writes.

mod cached;
mod invalidation;
mod model;
mod repository;

pub use cached::{CachedPosts, ReadThroughOptions};
pub use invalidation::{InvalidationPlan, InvalidationPolicy};
pub use model::{CachedValue, CompletePost, NewPost, Pagination, Post, PostPage, PostUpdate};
pub use repository::{InMemoryPostRepository, PostRepository, RepoError};
