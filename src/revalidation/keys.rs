//! Cooldown key derivation.
//!
//! Keys depend on the normalized path alone, so every event kind touching a
//! path shares one cooldown window.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::domain::paths::RevalidationPath;

pub type CooldownKey = u64;

/// Compute a hash for any hashable value.
pub fn hash_value<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

pub fn cooldown_key(path: &RevalidationPath) -> CooldownKey {
    hash_value(&path.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_paths_share_a_key() {
        let a = RevalidationPath::normalize("https://example.com/blog/post", "https://example.com");
        let b = RevalidationPath::normalize("/blog/post/", "https://example.com");
        assert_eq!(cooldown_key(&a), cooldown_key(&b));
    }

    #[test]
    fn different_paths_produce_different_keys() {
        let a = RevalidationPath::normalize("/blog/one/", "");
        let b = RevalidationPath::normalize("/blog/two/", "");
        assert_ne!(cooldown_key(&a), cooldown_key(&b));
    }
}
