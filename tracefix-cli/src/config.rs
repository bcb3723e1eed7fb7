//! Configuration file loading for tracefix.
//!
//! Discovers and loads `tracefix.toml` from the working directory.
//! Merges config file settings with CLI arguments (CLI takes precedence).

use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracefix_core::{Settings, SpanPattern};
use tracefix_types::TraceError;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "tracefix.toml";

/// Generated code is left alone by the CLI in addition to `cmd` packages.
pub const GENERATED_EXCLUDE: &str = "/generated(/|$)";

/// Top-level configuration from tracefix.toml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracefixConfig {
    /// Exclusion patterns. When given, they replace the default list.
    pub exclude: Vec<String>,
    pub tagged: bool,
    pub exported: bool,
    pub methods: bool,

    /// The tracing API calls to generate and recognize.
    pub pattern: SpanPattern,

    /// Import path to package name, for imports whose name differs from the path.
    pub hints: BTreeMap<String, String>,
}

/// Exclusion patterns used when neither the file nor the command line names any.
pub fn default_excludes() -> Vec<String> {
    let mut exclude = Settings::default_settings().exclude;
    exclude.push(GENERATED_EXCLUDE.to_string());
    exclude
}

/// Discover the tracefix.toml config file in `dir`.
pub fn discover_config(dir: &Utf8Path) -> Option<Utf8PathBuf> {
    let config_path = dir.join(CONFIG_FILE_NAME);
    if config_path.exists() {
        debug!("found config file at {}", config_path);
        Some(config_path)
    } else {
        debug!("no config file found at {}", config_path);
        None
    }
}

/// Load and parse a tracefix.toml config file.
pub fn load_config(path: &Utf8Path) -> Result<TracefixConfig, TraceError> {
    let contents = fs::read_to_string(path).map_err(|e| TraceError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    parse_config(&contents).map_err(|e| TraceError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Parse a config file from a string.
pub fn parse_config(contents: &str) -> Result<TracefixConfig, toml::de::Error> {
    toml::from_str(contents)
}

/// Load the explicit config file, else the one in `dir`, else the defaults.
pub fn load_or_default(
    explicit: Option<&Utf8Path>,
    dir: &Utf8Path,
) -> Result<TracefixConfig, TraceError> {
    match explicit.map(Utf8Path::to_path_buf).or_else(|| discover_config(dir)) {
        Some(path) => load_config(&path),
        None => Ok(TracefixConfig::default()),
    }
}

/// Command-line values that override or extend the config file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub exclude: Vec<String>,
    pub tagged: bool,
    pub exported: bool,
    pub methods: bool,
    pub hints: BTreeMap<String, String>,
}

/// Merged configuration combining config file and CLI arguments.
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub settings: Settings,
    pub pattern: SpanPattern,
    pub hints: BTreeMap<String, String>,
}

/// Builder for merging config file with CLI arguments.
pub struct ConfigMerger {
    config: TracefixConfig,
}

impl ConfigMerger {
    pub fn new(config: TracefixConfig) -> Self {
        Self { config }
    }

    /// CLI `exclude` patterns extend the file's list, boolean flags OR with the file and CLI
    /// hints override file hints.
    pub fn merge(self, cli: &CliOverrides) -> MergedConfig {
        let mut exclude = self.config.exclude;
        for pattern in &cli.exclude {
            if !exclude.contains(pattern) {
                exclude.push(pattern.clone());
            }
        }
        if exclude.is_empty() {
            exclude = default_excludes();
        }

        let mut hints = self.config.hints;
        hints.extend(cli.hints.iter().map(|(k, v)| (k.clone(), v.clone())));

        MergedConfig {
            settings: Settings {
                exclude,
                tagged: cli.tagged || self.config.tagged,
                exported: cli.exported || self.config.exported,
                methods: cli.methods || self.config.methods,
            },
            pattern: self.config.pattern,
            hints,
        }
    }
}

/// Parse `--hint` values of the form `import/path=name`.
pub fn parse_hints(hints: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut out = BTreeMap::new();
    for entry in hints {
        let mut parts = entry.splitn(2, '=');
        let path = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid hint '{}': missing import path", entry))?;
        let name = parts
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow::anyhow!("invalid hint '{}': missing package name", entry))?;
        out.insert(path.to_string(), name.to_string());
    }
    Ok(out)
}
