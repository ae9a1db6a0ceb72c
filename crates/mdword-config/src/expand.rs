//! Environment variable and home directory expansion for config strings.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::ConfigError;

static VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}|([A-Za-z_][A-Za-z0-9_]*))")
        .expect("invalid env var regex")
});

/// Expand `$VAR`, `${VAR}` and `${VAR:-default}` references in `value`.
///
/// A reference to an unset variable without a default is an error naming
/// `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    let mut missing = None;
    let expanded = VAR_PATTERN.replace_all(value, |caps: &Captures<'_>| {
        let Some(name) = caps.get(1).or_else(|| caps.get(3)) else {
            return caps[0].to_owned();
        };
        let name = name.as_str();
        match (std::env::var(name), caps.get(2)) {
            (Ok(v), _) => v,
            (Err(_), Some(default)) => default.as_str().to_owned(),
            (Err(_), None) => {
                missing.get_or_insert_with(|| name.to_owned());
                String::new()
            }
        }
    });

    if let Some(name) = missing {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{name}}} not set"),
        });
    }
    Ok(expanded.into_owned())
}

/// Expand environment references, then a leading `~`.
pub(crate) fn expand_path(value: &str, field: &str) -> Result<String, ConfigError> {
    let expanded = expand_env(value, field)?;
    Ok(shellexpand::tilde(&expanded).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_value_unchanged() {
        assert_eq!(expand_env("pandoc", "tools.pandoc").unwrap(), "pandoc");
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = expand_env("${MDWORD_TEST_SURELY_UNSET:-/opt/mmdc}", "tools.mermaid").unwrap();
        assert_eq!(value, "/opt/mmdc");
    }

    #[test]
    fn test_set_variable_wins_over_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDWORD_TEST_TOOLS", "/usr/local/tools");
        }

        let value = expand_env("${MDWORD_TEST_TOOLS:-/nope}/pandoc", "tools.pandoc").unwrap();
        assert_eq!(value, "/usr/local/tools/pandoc");

        unsafe {
            std::env::remove_var("MDWORD_TEST_TOOLS");
        }
    }

    #[test]
    fn test_bare_variable_expanded() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDWORD_TEST_BARE_HOME", "/home/writer");
        }

        let value = expand_path("$MDWORD_TEST_BARE_HOME/bin/mmdc", "tools.mermaid").unwrap();
        assert_eq!(value, "/home/writer/bin/mmdc");

        unsafe {
            std::env::remove_var("MDWORD_TEST_BARE_HOME");
        }
    }

    #[test]
    fn test_bare_unset_variable_is_error() {
        let err = expand_env("$MDWORD_TEST_BARE_MISSING/pandoc", "tools.pandoc").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { ref field, .. } if field == "tools.pandoc"));
    }

    #[test]
    fn test_lone_dollar_kept() {
        assert_eq!(expand_env("/opt/$/pandoc", "tools.pandoc").unwrap(), "/opt/$/pandoc");
    }

    #[test]
    fn test_unset_without_default_is_error() {
        let err = expand_env("${MDWORD_TEST_MISSING_VAR}/bin", "tools.pandoc").unwrap_err();
        match err {
            ConfigError::EnvVar { field, message } => {
                assert_eq!(field, "tools.pandoc");
                assert!(message.contains("MDWORD_TEST_MISSING_VAR"));
            }
            other => panic!("Expected EnvVar error, got {other:?}"),
        }
    }

    #[test]
    fn test_tilde_expanded_in_paths() {
        let value = expand_path("~/bin/mmdc", "tools.mermaid").unwrap();
        assert!(!value.starts_with('~'));
        assert!(value.ends_with("/bin/mmdc"));
    }
}
