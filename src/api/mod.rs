//! API Module
//!
//! HTTP handlers and routing for the post REST API.
//!
//! # Endpoints
//! - `GET /posts` - List posts (`page`, `limit`, `category`)
//! - `POST /posts` - Create a post
//! - `GET /posts/trending` - Newest posts (`limit`)
//! - `GET /posts/id/:id` - Post by id
//! - `GET /posts/:slug` - Post by slug
//! - `GET /posts/:slug/complete` - Post with related posts
//! - `PUT /posts/:id` - Update a post
//! - `DELETE /posts/:id` - Delete a post
//! - `GET /cache/stats` - Cache statistics
//! - `POST /cache/clear` - Drop every cache entry
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
