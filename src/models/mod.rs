//! Request and Response models for the post API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{CreatePostRequest, ListQuery, TrendingQuery, UpdatePostRequest};
pub use responses::{ClearResponse, DeleteResponse, HealthResponse};
