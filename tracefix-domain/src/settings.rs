use regex::Regex;
use serde::{Deserialize, Serialize};
use tracefix_types::TraceError;
use tracefix_types::dst::is_exported;

/// Packages under a `cmd` directory are left alone unless the caller says otherwise.
pub const DEFAULT_EXCLUDE: &str = "/cmd(/|$)";

/// Run configuration as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Regular expressions matched against `<package dir>/<package name>`.
    pub exclude: Vec<String>,
    /// Only instrument tagged types, functions and methods.
    pub tagged: bool,
    /// Only instrument exported names.
    pub exported: bool,
    /// Only instrument methods.
    pub methods: bool,
}

impl Settings {
    pub fn default_settings() -> Self {
        Self {
            exclude: vec![DEFAULT_EXCLUDE.to_string()],
            ..Self::default()
        }
    }

    /// Compiles the exclusion patterns. The first invalid pattern aborts.
    pub fn parse(self) -> Result<ResolvedSettings, TraceError> {
        let mut exclude = Vec::with_capacity(self.exclude.len());
        for pattern in &self.exclude {
            let re = Regex::new(pattern).map_err(|e| TraceError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?;
            exclude.push(re);
        }
        Ok(ResolvedSettings {
            settings: self,
            exclude,
        })
    }
}

/// [`Settings`] with compiled exclusion matchers. Immutable once built.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    settings: Settings,
    exclude: Vec<Regex>,
}

impl ResolvedSettings {
    pub fn tagged(&self) -> bool {
        self.settings.tagged
    }

    pub fn exported(&self) -> bool {
        self.settings.exported
    }

    pub fn methods(&self) -> bool {
        self.settings.methods
    }

    pub fn is_excluded(&self, match_path: &str) -> bool {
        self.exclude.iter().any(|re| re.is_match(match_path))
    }

    /// Name policy: under `exported`, unexported names are skipped.
    pub fn skip_by_name(&self, name: &str) -> bool {
        self.settings.exported && !is_exported(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_excludes_cmd_packages() {
        let s = Settings::default_settings().parse().unwrap();
        assert!(s.is_excluded("/src/app/cmd/main"));
        assert!(s.is_excluded("/src/app/cmd"));
        assert!(!s.is_excluded("/src/app/cmdline/cmdline"));
        assert!(!s.is_excluded("/src/app/svc/svc"));
    }

    #[test]
    fn invalid_pattern_names_the_pattern() {
        let err = Settings {
            exclude: vec!["ok".to_string(), "(".to_string()],
            ..Settings::default()
        }
        .parse()
        .unwrap_err();
        match err {
            TraceError::Pattern { pattern, .. } => assert_eq!(pattern, "("),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn exported_policy_skips_lower_case() {
        let s = Settings {
            exported: true,
            ..Settings::default()
        }
        .parse()
        .unwrap();
        assert!(s.skip_by_name("foo"));
        assert!(!s.skip_by_name("Foo"));

        let open = Settings::default().parse().unwrap();
        assert!(!open.skip_by_name("foo"));
    }
}
