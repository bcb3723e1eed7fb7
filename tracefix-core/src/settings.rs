//! Clap-free settings for a transform run.

use camino::Utf8PathBuf;
use std::collections::BTreeMap;
use tracefix_domain::Settings;
use tracefix_edit::SpanPattern;

/// Everything a run needs besides its ports.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Directory changed paths are reported relative to.
    pub root: Utf8PathBuf,
    pub settings: Settings,
    pub pattern: SpanPattern,
    /// Import path to package name, for imports whose name differs from the path's last element.
    pub hints: BTreeMap<String, String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            root: Utf8PathBuf::from("."),
            settings: Settings::default_settings(),
            pattern: SpanPattern::default(),
            hints: BTreeMap::new(),
        }
    }
}

impl RunSettings {
    /// Caller hints with the span pattern's package name underneath them.
    pub fn resolver_hints(&self) -> BTreeMap<String, String> {
        let mut hints = self.pattern.hints();
        hints.extend(self.hints.iter().map(|(k, v)| (k.clone(), v.clone())));
        hints
    }
}
