//! Startup configuration read from the environment.

use std::env;

use regex::Regex;

use crate::{Error, Result};

/// Namespace(s) the operator watches; empty string means all namespaces.
pub const WATCH_NAMESPACE_ENV: &str = "WATCH_NAMESPACE";

/// Comma-separated regexes of label keys stripped before propagation.
pub const LABELS_TO_REMOVE_ENV: &str =
    "PLATFORM_OPERATOR_WORKSPACES_CONFIG_CONTROLLER_LABELS_TO_REMOVE_BEFORE_SYNC_REGEXP";

/// Comma-separated regexes of annotation keys stripped before propagation.
pub const ANNOTATIONS_TO_REMOVE_ENV: &str =
    "PLATFORM_OPERATOR_WORKSPACES_CONFIG_CONTROLLER_ANNOTATIONS_TO_REMOVE_BEFORE_SYNC_REGEXP";

/// Test mode switch; the infrastructure probe skips live discovery when set.
pub const MOCK_API_ENV: &str = "MOCK_API";

/// Parsed operator configuration.
#[derive(Clone, Debug, Default)]
pub struct OperatorConfig {
    /// Namespace to watch; empty = all
    pub watch_namespace: String,
    /// Label keys matching any of these are stripped before sync
    pub labels_to_remove: Vec<Regex>,
    /// Annotation keys matching any of these are stripped before sync
    pub annotations_to_remove: Vec<Regex>,
}

impl OperatorConfig {
    /// Read the configuration from the environment.
    ///
    /// # Errors
    /// Returns [`Error::Configuration`] when `WATCH_NAMESPACE` is missing or
    /// a removal-list regex does not parse.
    pub fn from_env() -> Result<Self> {
        let watch_namespace = env::var(WATCH_NAMESPACE_ENV).map_err(|_| {
            Error::Configuration(format!("{WATCH_NAMESPACE_ENV} must be set (may be empty)"))
        })?;

        Ok(OperatorConfig {
            watch_namespace,
            labels_to_remove: parse_regex_list(
                &env::var(LABELS_TO_REMOVE_ENV).unwrap_or_default(),
            )?,
            annotations_to_remove: parse_regex_list(
                &env::var(ANNOTATIONS_TO_REMOVE_ENV).unwrap_or_default(),
            )?,
        })
    }
}

/// Parse a comma-separated regex list; blank segments are skipped.
///
/// # Errors
/// Propagates the first regex compile failure.
pub fn parse_regex_list(raw: &str) -> Result<Vec<Regex>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| Regex::new(s).map_err(Error::from))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn regex_list_parses_and_skips_blanks() {
        let list = parse_regex_list("^foo.*, ,bar$").unwrap();
        assert_eq!(list.len(), 2);
        assert!(list[0].is_match("foobar"));
        assert!(list[1].is_match("rebar"));
    }

    #[test]
    fn regex_list_rejects_invalid_patterns() {
        assert!(parse_regex_list("(unclosed").is_err());
    }

    #[test]
    fn missing_watch_namespace_is_an_error() {
        temp_env::with_var_unset(WATCH_NAMESPACE_ENV, || {
            assert!(matches!(
                OperatorConfig::from_env(),
                Err(Error::Configuration(_))
            ));
        });
    }

    #[test]
    fn empty_watch_namespace_means_all() {
        temp_env::with_vars(
            [
                (WATCH_NAMESPACE_ENV, Some("")),
                (LABELS_TO_REMOVE_ENV, None),
                (ANNOTATIONS_TO_REMOVE_ENV, None),
            ],
            || {
                let cfg = OperatorConfig::from_env().unwrap();
                assert!(cfg.watch_namespace.is_empty());
                assert!(cfg.labels_to_remove.is_empty());
            },
        );
    }
}
