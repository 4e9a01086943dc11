//! Structured logging support.
//!
//! Builds the tracing filter from `LoggingConfig` and provides the render
//! correlation IDs that tie a cache lookup, source fetch, and sanitizer
//! pass together in the log stream.

use uuid::Uuid;

/// Generate a correlation ID for one pass through the render pipeline.
pub fn render_id() -> String {
    Uuid::new_v4().to_string()
}

/// Build an `EnvFilter` directive string from the logging config.
///
/// The base level comes first, followed by one `mosaic::<component>=<level>`
/// directive per configured component, sorted by name so the resulting
/// string is deterministic.
///
/// # Examples
///
/// ```
/// use mosaic::config::LoggingConfig;
/// use mosaic::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// config.component_levels.insert("cache".to_string(), "debug".to_string());
///
/// assert_eq!(build_filter_directives(&config), "info,mosaic::cache=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter = config.level.clone();

    let mut components: Vec<_> = config.component_levels.iter().collect();
    components.sort();
    for (component, level) in components {
        filter.push_str(&format!(",mosaic::{}={}", component, level));
    }

    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;

    #[test]
    fn test_base_level_only() {
        let config = LoggingConfig {
            level: "warn".to_string(),
            ..Default::default()
        };
        assert_eq!(build_filter_directives(&config), "warn");
    }

    #[test]
    fn test_component_levels_appended_sorted() {
        let mut config = LoggingConfig::default();
        config
            .component_levels
            .insert("sanitize".to_string(), "trace".to_string());
        config
            .component_levels
            .insert("cache".to_string(), "debug".to_string());
        assert_eq!(
            build_filter_directives(&config),
            "info,mosaic::cache=debug,mosaic::sanitize=trace"
        );
    }

    #[test]
    fn test_render_ids_unique_and_parseable() {
        let a = render_id();
        let b = render_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }
}
