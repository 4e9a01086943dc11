//! Canonical cache keys.
//!
//! A cache key is the tile ID plus its query parameters in a canonical
//! order, so `?a=1&b=2` and `?b=2&a=1` hit the same entry.

use std::fmt;

/// Canonical cache key for a rendered tile variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Build a key from a tile ID and its query parameters.
    ///
    /// Parameters are sorted by name (then value, for repeated names);
    /// values are case-sensitive. Delimiter characters inside names and
    /// values are escaped so distinct parameter lists never share a key.
    pub fn new(tile_id: &str, params: &[(String, String)]) -> Self {
        let mut sorted: Vec<&(String, String)> = params.iter().collect();
        sorted.sort();

        let mut key = String::with_capacity(tile_id.len() + 16 * sorted.len());
        escape_into(&mut key, tile_id);
        key.push('|');
        for (name, value) in sorted {
            escape_into(&mut key, name);
            key.push('=');
            escape_into(&mut key, value);
            key.push('&');
        }
        Self(key)
    }

    /// The key prefix shared by every variant of a tile.
    ///
    /// Used for whole-tile invalidation after a callback dispatch.
    pub fn tile_prefix(tile_id: &str) -> String {
        let mut prefix = String::with_capacity(tile_id.len() + 1);
        escape_into(&mut prefix, tile_id);
        prefix.push('|');
        prefix
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Append `part` with the key delimiters (`=`, `&`, `|`) percent-escaped.
fn escape_into(out: &mut String, part: &str) {
    for ch in part.chars() {
        match ch {
            '%' => out.push_str("%25"),
            '=' => out.push_str("%3D"),
            '&' => out.push_str("%26"),
            '|' => out.push_str("%7C"),
            c => out.push(c),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_param_order_does_not_matter() {
        let a = CacheKey::new("sales", &params(&[("region", "emea"), ("year", "2024")]));
        let b = CacheKey::new("sales", &params(&[("year", "2024"), ("region", "emea")]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_values_are_case_sensitive() {
        let a = CacheKey::new("sales", &params(&[("region", "emea")]));
        let b = CacheKey::new("sales", &params(&[("region", "EMEA")]));
        assert_ne!(a, b);
    }

    #[test]
    fn test_different_tiles_never_collide() {
        let a = CacheKey::new("sales", &[]);
        let b = CacheKey::new("sales2", &[]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_prefix_matches_all_variants() {
        let bare = CacheKey::new("sales", &[]);
        let with_params = CacheKey::new("sales", &params(&[("region", "emea")]));
        let prefix = CacheKey::tile_prefix("sales");

        assert!(bare.as_str().starts_with(&prefix));
        assert!(with_params.as_str().starts_with(&prefix));
        // A tile whose ID shares a prefix does not match
        let other = CacheKey::new("sales-eu", &[]);
        assert!(!other.as_str().starts_with(&prefix));
    }

    #[test]
    fn test_delimiters_in_values_do_not_collide() {
        let a = CacheKey::new("t", &params(&[("a", "b&c=d")]));
        let b = CacheKey::new("t", &params(&[("a", "b"), ("c", "d")]));
        assert_ne!(a, b);

        let c = CacheKey::new("t", &params(&[("a", "b|c")]));
        let d = CacheKey::new("t", &params(&[("a", "b%7Cc")]));
        assert_ne!(c, d);
    }

    #[test]
    fn test_repeated_param_names_sorted_by_value() {
        let a = CacheKey::new("t", &params(&[("tag", "b"), ("tag", "a")]));
        let b = CacheKey::new("t", &params(&[("tag", "a"), ("tag", "b")]));
        assert_eq!(a, b);
    }
}
