//! Configuration for verification runs.
//!
//! ```toml
//! [verify]
//! concurrency = 8
//! check_round_trip = true
//! rewrite_braces = true
//! max_depth = 64
//!
//! [report]
//! pretty = true
//! include_cleaned = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PatternError, PatternResult};
use crate::parser::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};

/// Project-local config file name.
pub const CONFIG_FILE: &str = "sqlpattern.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub verify: VerifyConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// Templates verified at once by the concurrent driver.
    pub concurrency: usize,
    /// Re-parse generated text and compare statements.
    pub check_round_trip: bool,
    /// Rewrite `{`/`}` to `[`/`]` while cleaning.
    pub rewrite_braces: bool,
    /// Expression nesting limit.
    pub max_depth: usize,
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            concurrency: 8,
            check_round_trip: true,
            rewrite_braces: true,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub pretty: bool,
    /// Echo cleaned text in each template report.
    pub include_cleaned: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            include_cleaned: false,
        }
    }
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    pub fn from_toml_str(content: &str) -> PatternResult<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| PatternError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> PatternResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            PatternError::Config(message) => {
                PatternError::Config(format!("{}: {}", path.display(), message))
            }
            other => other,
        })
    }

    /// Load from `explicit` if given, else the first existing file among
    /// [`Config::search_paths`], else defaults.
    pub fn load(explicit: Option<&Path>) -> PatternResult<Self> {
        if let Some(path) = explicit {
            debug!(path = %path.display(), "loading config");
            return Self::from_file(path);
        }
        for path in Self::search_paths() {
            if path.is_file() {
                debug!(path = %path.display(), "loading config");
                return Self::from_file(&path);
            }
        }
        debug!("no config file found, using defaults");
        Ok(Self::default())
    }

    /// `./sqlpattern.toml`, then the user config directory.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("sqlpattern").join("config.toml"));
        }
        paths
    }

    fn validate(&self) -> PatternResult<()> {
        if self.verify.concurrency == 0 {
            return Err(PatternError::Config(
                "verify.concurrency must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_DEPTH_LIMIT).contains(&self.verify.max_depth) {
            return Err(PatternError::Config(format!(
                "verify.max_depth must be between 1 and {}",
                MAX_DEPTH_LIMIT
            )));
        }
        Ok(())
    }
}

/// Builder for [`Config`]
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.verify.concurrency = n.max(1);
        self
    }

    pub fn check_round_trip(mut self, enabled: bool) -> Self {
        self.config.verify.check_round_trip = enabled;
        self
    }

    pub fn rewrite_braces(mut self, enabled: bool) -> Self {
        self.config.verify.rewrite_braces = enabled;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.verify.max_depth = depth.clamp(1, MAX_DEPTH_LIMIT);
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.config.report.pretty = pretty;
        self
    }

    pub fn include_cleaned(mut self, include: bool) -> Self {
        self.config.report.include_cleaned = include;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
