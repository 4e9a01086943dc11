//! Sanitizer configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sanitizer configuration.
///
/// The built-in allow-list covers structural and text markup. Deployments
/// can extend it for trusted tile sources but can never re-enable the
/// hard-banned elements (`script`, `style`, `iframe`, `object`, `embed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Additional tags to allow beyond the built-in set
    pub extra_tags: Vec<String>,
    /// Additional attributes to allow, keyed by tag (e.g. {"td": ["colspan"]})
    pub extra_attributes: HashMap<String, Vec<String>>,
    /// Strip HTML comments from output
    pub strip_comments: bool,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            extra_tags: Vec::new(),
            extra_attributes: HashMap::new(),
            strip_comments: true,
        }
    }
}
