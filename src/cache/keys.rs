//! Cache key generators.
//!
//! Every cached read path names its key here so readers and the
//! invalidation policy agree on the layout.

/// Single post by slug: `post:<slug>`
pub fn post(slug: &str) -> String {
    format!("post:{slug}")
}

/// Single post by id: `post:id:<id>`
pub fn post_by_id(id: i64) -> String {
    format!("post:id:{id}")
}

/// Post together with its related posts: `complete_post:<category>:<slug>`
///
/// Scoped by category because the related posts come from that category.
pub fn complete_post(category: &str, slug: &str) -> String {
    format!("complete_post:{category}:{slug}")
}

/// Newest-first listing page: `posts:list:<page>:<limit>`
pub fn posts_list(page: u32, limit: u32) -> String {
    format!("posts:list:{page}:{limit}")
}

/// Trending posts: `posts:trending:<n>`
pub fn trending(count: u32) -> String {
    format!("posts:trending:{count}")
}

/// Listing page scoped to one category: `post_list:<category>:<page>:<limit>`
pub fn category_list(category: &str, page: u32, limit: u32) -> String {
    format!("post_list:{category}:{page}:{limit}")
}

// == Prefixes ==

/// First listing page, whatever the page size.
pub fn first_list_page_prefix() -> String {
    "posts:list:1:".to_string()
}

/// Every trending key, whatever the count.
pub fn trending_prefix() -> String {
    "posts:trending:".to_string()
}

/// Every listing page of one category.
pub fn category_list_prefix(category: &str) -> String {
    format!("post_list:{category}:")
}

/// Every post-with-related entry of one category.
pub fn complete_post_prefix(category: &str) -> String {
    format!("complete_post:{category}:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout() {
        assert_eq!(post("hello"), "post:hello");
        assert_eq!(post_by_id(7), "post:id:7");
        assert_eq!(complete_post("tech", "hello"), "complete_post:tech:hello");
        assert_eq!(posts_list(1, 10), "posts:list:1:10");
        assert_eq!(trending(5), "posts:trending:5");
        assert_eq!(category_list("tech", 2, 10), "post_list:tech:2:10");
    }

    #[test]
    fn prefixes_match_their_keys() {
        assert!(posts_list(1, 10).starts_with(&first_list_page_prefix()));
        assert!(!posts_list(10, 10).starts_with(&first_list_page_prefix()));
        assert!(trending(5).starts_with(&trending_prefix()));
        assert!(category_list("tech", 3, 20).starts_with(&category_list_prefix("tech")));
        assert!(!category_list("technology", 1, 10).starts_with(&category_list_prefix("tech")));
        assert!(complete_post("tech", "a").starts_with(&complete_post_prefix("tech")));
        assert!(!complete_post("technology", "a").starts_with(&complete_post_prefix("tech")));
    }
}
