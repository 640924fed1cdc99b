//! Local response caching.
//!
//! [`LocalResponseCache`] memoizes resolved values (image URLs) in a
//! [`CacheStore`] with a version tag and a TTL, so repeated lookups for the
//! same name skip the upstream call. Bumping [`IMAGE_CACHE_VERSION`]
//! invalidates every previously cached image without a migration step.
//!
//! - [`store::FileStore`]: durable, one JSON file per key
//! - [`store::MemoryStore`]: bounded in-process store (moka)

pub mod clock;
pub mod local;
pub mod store;

use std::time::Duration;

pub use clock::{Clock, ManualClock, SystemClock};
pub use local::{CacheEntry, LocalResponseCache};
pub use store::{CacheStore, FileStore, MemoryStore};

/// Version of the image-lookup cache. Bump when the logic choosing what to
/// cache for a name changes (e.g. the image-lookup keyword list).
pub const IMAGE_CACHE_VERSION: &str = "v2";

/// Default entry lifetime: 7 days.
pub const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 3600);

/// Cache key for an image lookup by subject name.
///
/// Lowercases the name and collapses every run of non-alphanumeric
/// characters into a single `-`. Returns `None` when nothing is left.
pub fn image_cache_key(name: &str) -> Option<String> {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    (!slug.is_empty()).then(|| format!("exercise_image_{slug}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_keys_are_slugged() {
        assert_eq!(
            image_cache_key("Push-ups").as_deref(),
            Some("exercise_image_push-ups")
        );
        assert_eq!(
            image_cache_key("  Dumbbell   Row!! ").as_deref(),
            Some("exercise_image_dumbbell-row")
        );
        assert_eq!(image_cache_key("?!"), None);
    }
}
