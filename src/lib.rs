//! Post Cache - blog post data access with a bounded in-memory cache
//!
//! Provides a TTL cache with FIFO eviction, selective invalidation on post
//! writes, and a REST API over both.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod posts;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::{spawn_sweep_task, ManagedCache};
