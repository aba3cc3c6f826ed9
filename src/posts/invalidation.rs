//! Selective cache invalidation for post writes.
//!
//! Only keys a changed post could plausibly appear under are removed; the
//! rest of the cache survives the write.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};

use crate::cache::{keys, CacheStore};
use crate::posts::Post;

/// Recency windows deciding which listing keys a post write touches.
#[derive(Debug, Clone, Copy)]
pub struct InvalidationPolicy {
    /// Posts younger than this may sit on the first listing page.
    pub list_window: Duration,
    /// Posts younger than this may sit in the trending set.
    pub trending_window: Duration,
}

impl Default for InvalidationPolicy {
    fn default() -> Self {
        Self {
            list_window: Duration::days(7),
            trending_window: Duration::hours(24),
        }
    }
}

impl InvalidationPolicy {
    /// Lists the keys to drop after `post` was created, updated or deleted.
    ///
    /// Posts dated in the future count as recent.
    pub fn plan(&self, post: &Post, now: DateTime<Utc>) -> InvalidationPlan {
        let mut plan = InvalidationPlan::default();
        let age = now.signed_duration_since(post.created_at);

        plan.keys.insert(keys::post(&post.slug));
        plan.keys.insert(keys::post_by_id(post.id));
        plan.prefixes
            .insert(keys::category_list_prefix(&post.category_slug));
        // Other posts of the category may list this one as related
        plan.prefixes
            .insert(keys::complete_post_prefix(&post.category_slug));

        if age <= self.list_window {
            plan.prefixes.insert(keys::first_list_page_prefix());
        }
        if age <= self.trending_window {
            plan.prefixes.insert(keys::trending_prefix());
        }

        plan
    }
}

/// Exact keys and key prefixes to remove from the cache.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvalidationPlan {
    pub keys: BTreeSet<String>,
    pub prefixes: BTreeSet<String>,
}

impl InvalidationPlan {
    pub fn merge(&mut self, other: InvalidationPlan) {
        self.keys.extend(other.keys);
        self.prefixes.extend(other.prefixes);
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.prefixes.is_empty()
    }

    /// Removes the planned keys from `store`. Returns how many entries went.
    pub fn apply<V: Clone>(&self, store: &mut CacheStore<V>) -> usize {
        let exact = self.keys.iter().filter(|key| store.delete(key)).count();
        let prefixed: usize = self
            .prefixes
            .iter()
            .map(|prefix| store.delete_prefix(prefix))
            .sum();
        exact + prefixed
    }
}
