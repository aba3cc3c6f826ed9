//! Read-through post access backed by the shared cache.
//!
//! Reads try the cache first and fall back to the record store. Writes go to
//! the record store first and then invalidate the affected keys. A failed
//! write leaves the cache untouched.
//!
//! Every invalidation bumps a generation counter. A fill only lands if no
//! invalidation ran since its record store read started, so a slow read
//! cannot put back a row that a concurrent write already replaced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::cache::{keys, SharedCache};
use crate::posts::{
    CachedValue, CompletePost, InvalidationPlan, InvalidationPolicy, NewPost, Post, PostPage,
    PostRepository, PostUpdate, RepoError,
};

/// Related posts shown next to a post.
const RELATED_POSTS: usize = 3;

/// Tuning for [`CachedPosts`].
#[derive(Debug, Clone, Copy)]
pub struct ReadThroughOptions {
    /// TTL for single-post keys
    pub entity_ttl: Duration,
    /// TTL for listing and trending keys
    pub list_ttl: Duration,
    /// Share of the entry bound above which entity misses are not written back
    pub write_back_guard: f64,
    pub policy: InvalidationPolicy,
}

impl Default for ReadThroughOptions {
    fn default() -> Self {
        Self {
            entity_ttl: Duration::from_secs(5 * 60),
            list_ttl: Duration::from_secs(2 * 60),
            write_back_guard: 0.8,
            policy: InvalidationPolicy::default(),
        }
    }
}

/// Post data-access layer wrapping a record store with the shared cache.
pub struct CachedPosts {
    repo: Arc<dyn PostRepository>,
    cache: SharedCache<CachedValue>,
    options: ReadThroughOptions,
    /// Bumped under the cache write lock by every invalidation
    generation: AtomicU64,
}

impl CachedPosts {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        cache: SharedCache<CachedValue>,
        options: ReadThroughOptions,
    ) -> Self {
        Self {
            repo,
            cache,
            options,
            generation: AtomicU64::new(0),
        }
    }

    pub fn cache(&self) -> SharedCache<CachedValue> {
        self.cache.clone()
    }

    pub fn repository(&self) -> Arc<dyn PostRepository> {
        self.repo.clone()
    }

    // == Reads ==

    pub async fn by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        if let Some(post) = self.lookup(&keys::post(slug), CachedValue::into_post).await {
            return Ok(Some(post));
        }

        let generation = self.generation();
        let post = self.repo.find_by_slug(slug).await?;
        if let Some(post) = &post {
            self.write_back_post(post, generation).await;
        }
        Ok(post)
    }

    pub async fn by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        if let Some(post) = self.lookup(&keys::post_by_id(id), CachedValue::into_post).await {
            return Ok(Some(post));
        }

        let generation = self.generation();
        let post = self.repo.find_by_id(id).await?;
        if let Some(post) = &post {
            self.write_back_post(post, generation).await;
        }
        Ok(post)
    }

    /// A post with related posts from its category.
    ///
    /// The post itself is resolved first (usually from the cache) since the
    /// combined entry is keyed by its category.
    pub async fn complete(&self, slug: &str) -> Result<Option<CompletePost>, RepoError> {
        let generation = self.generation();
        let Some(post) = self.by_slug(slug).await? else {
            return Ok(None);
        };

        let key = keys::complete_post(&post.category_slug, &post.slug);
        if let Some(complete) = self.lookup(&key, CachedValue::into_complete).await {
            return Ok(Some(complete));
        }

        // One extra so that dropping the post itself still leaves enough
        let related = self
            .repo
            .list_by_category(&post.category_slug, 1, RELATED_POSTS as u32 + 1)
            .await?;
        let related_posts = related
            .posts
            .into_iter()
            .filter(|candidate| candidate.slug != post.slug)
            .take(RELATED_POSTS)
            .collect();

        let complete = CompletePost {
            post,
            related_posts,
        };
        self.write_back(
            key,
            CachedValue::Complete(complete.clone()),
            self.options.entity_ttl,
            generation,
        )
        .await;
        Ok(Some(complete))
    }

    pub async fn list(&self, page: u32, limit: u32) -> Result<PostPage, RepoError> {
        let key = keys::posts_list(page, limit);
        if let Some(page) = self.lookup(&key, CachedValue::into_page).await {
            return Ok(page);
        }

        let generation = self.generation();
        let fetched = self.repo.list(page, limit).await?;
        self.fill(key, CachedValue::Page(fetched.clone()), self.options.list_ttl, generation)
            .await;
        Ok(fetched)
    }

    pub async fn trending(&self, count: u32) -> Result<Vec<Post>, RepoError> {
        let key = keys::trending(count);
        if let Some(posts) = self.lookup(&key, CachedValue::into_posts).await {
            return Ok(posts);
        }

        let generation = self.generation();
        let fetched = self.repo.trending(count).await?;
        self.fill(key, CachedValue::Posts(fetched.clone()), self.options.list_ttl, generation)
            .await;
        Ok(fetched)
    }

    pub async fn list_by_category(
        &self,
        category_slug: &str,
        page: u32,
        limit: u32,
    ) -> Result<PostPage, RepoError> {
        let key = keys::category_list(category_slug, page, limit);
        if let Some(page) = self.lookup(&key, CachedValue::into_page).await {
            return Ok(page);
        }

        let generation = self.generation();
        let fetched = self
            .repo
            .list_by_category(category_slug, page, limit)
            .await?;
        self.fill(key, CachedValue::Page(fetched.clone()), self.options.list_ttl, generation)
            .await;
        Ok(fetched)
    }

    // == Writes ==

    pub async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let created = self.repo.create(post).await?;
        self.invalidate(&[&created]).await;
        info!(id = created.id, slug = %created.slug, "post created");
        Ok(created)
    }

    /// Updates a post and invalidates keys for both its old and new state.
    pub async fn update(&self, id: i64, update: PostUpdate) -> Result<Post, RepoError> {
        let previous = match self.repo.find_by_id(id).await {
            Ok(previous) => previous,
            Err(err) => {
                warn!(id, error = %err, "could not load post before update, old keys may stay cached");
                None
            }
        };

        let updated = self.repo.update(id, update).await?;
        match &previous {
            Some(previous) => self.invalidate(&[previous, &updated]).await,
            None => self.invalidate(&[&updated]).await,
        }
        info!(id, slug = %updated.slug, "post updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<Post, RepoError> {
        let removed = self.repo.delete(id).await?;
        self.invalidate(&[&removed]).await;
        info!(id, slug = %removed.slug, "post deleted");
        Ok(removed)
    }

    // == Pre-warming ==

    /// Fetches `slugs` concurrently and caches each one found.
    ///
    /// Failures are logged and skipped; whatever was cached stays cached.
    /// Returns the number of posts cached.
    pub async fn prewarm(&self, slugs: &[String]) -> usize {
        let generation = self.generation();
        let fetches = slugs.iter().map(|slug| async move {
            (slug, self.repo.find_by_slug(slug).await)
        });

        let mut cached = 0;
        for (slug, result) in join_all(fetches).await {
            match result {
                Ok(Some(post)) => {
                    let ttl = self.options.entity_ttl;
                    if self.fill(keys::post(slug), CachedValue::Post(post), ttl, generation).await {
                        debug!(slug = %slug, "pre-cached post");
                        cached += 1;
                    }
                }
                Ok(None) => warn!(slug = %slug, "cannot pre-cache missing post"),
                Err(err) => warn!(slug = %slug, error = %err, "failed to pre-cache post"),
            }
        }
        cached
    }

    // == Internals ==

    async fn lookup<T>(&self, key: &str, extract: fn(CachedValue) -> Option<T>) -> Option<T> {
        let value = self.cache.write().await.get(key)?;
        let extracted = extract(value);
        if extracted.is_none() {
            warn!(key, "cached value has unexpected shape");
        }
        extracted
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stores a value read from the record store while `generation` was
    /// current. Used for listing keys and pre-warming.
    ///
    /// Dropped if an invalidation ran since then.
    async fn fill(&self, key: String, value: CachedValue, ttl: Duration, generation: u64) -> bool {
        let mut cache = self.cache.write().await;
        if self.generation() != generation {
            debug!(key = %key, "dropping fill that raced an invalidation");
            return false;
        }

        cache.set(key, value, Some(ttl));
        true
    }

    /// Write-back after an entity miss, skipped near the entry bound or after
    /// a racing invalidation.
    async fn write_back(
        &self,
        key: String,
        value: CachedValue,
        ttl: Duration,
        generation: u64,
    ) -> bool {
        let mut cache = self.cache.write().await;
        if self.generation() != generation {
            debug!(key = %key, "dropping write-back that raced an invalidation");
            return false;
        }
        let guard = (cache.limits().max_entries as f64 * self.options.write_back_guard) as usize;
        if cache.len() >= guard {
            debug!(key = %key, len = cache.len(), guard, "skipping cache write-back near capacity");
            return false;
        }

        cache.set(key, value, Some(ttl));
        true
    }

    async fn write_back_post(&self, post: &Post, generation: u64) {
        let ttl = self.options.entity_ttl;
        self.write_back(keys::post(&post.slug), CachedValue::Post(post.clone()), ttl, generation)
            .await;
        self.write_back(keys::post_by_id(post.id), CachedValue::Post(post.clone()), ttl, generation)
            .await;
    }

    async fn invalidate(&self, posts: &[&Post]) {
        let now = Utc::now();
        let mut plan = InvalidationPlan::default();
        for post in posts {
            plan.merge(self.options.policy.plan(post, now));
        }

        let removed = {
            let mut cache = self.cache.write().await;
            self.generation.fetch_add(1, Ordering::AcqRel);
            plan.apply(&mut *cache)
        };
        debug!(removed, keys = ?plan.keys, prefixes = ?plan.prefixes, "invalidated post cache keys");
    }
}
