use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::NannyError;
use crate::threshold::{Limit, Limits};

/// Name of the configuration file looked up in the watched directory.
pub const CONFIG_FILE_NAME: &str = ".diffnanny.toml";

/// Configuration loaded from `.diffnanny.toml`.
///
/// Every key is optional and defaults independently. Keys are accepted both
/// in snake_case and in the camelCase spelling used by editor settings
/// (`maxDiffTotal`, `baseBranch`, ...).
///
/// Resolution order: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use nanny_core::NannyConfig;
///
/// let config = NannyConfig::default();
/// assert!(config.excludes.is_empty());
/// assert!(config.limits().is_unlimited());
/// assert_eq!(config.base(), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NannyConfig {
    /// Glob patterns of paths left out of the totals.
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Warn when inserted + deleted exceeds this (`-1` = unlimited).
    #[serde(default, alias = "maxDiffTotal")]
    pub max_diff_total: Limit,
    /// Warn when inserted exceeds this (`-1` = unlimited).
    #[serde(default, alias = "maxDiffInserts")]
    pub max_diff_inserts: Limit,
    /// Warn when deleted exceeds this (`-1` = unlimited).
    #[serde(default, alias = "maxDiffRemovals")]
    pub max_diff_removals: Limit,
    /// Reference to diff against; absent or empty means the index.
    #[serde(default, alias = "baseBranch")]
    pub base_branch: Option<String>,
    /// Seconds before a hanging `git diff` is abandoned (default: 10).
    #[serde(default = "default_git_timeout_secs", alias = "gitTimeoutSecs")]
    pub git_timeout_secs: u64,
}

fn default_git_timeout_secs() -> u64 {
    10
}

impl Default for NannyConfig {
    fn default() -> Self {
        Self {
            excludes: Vec::new(),
            max_diff_total: Limit::UNLIMITED,
            max_diff_inserts: Limit::UNLIMITED,
            max_diff_removals: Limit::UNLIMITED,
            base_branch: None,
            git_timeout_secs: default_git_timeout_secs(),
        }
    }
}

impl NannyConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`NannyError::Io`] if the file cannot be read, or
    /// [`NannyError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, NannyError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`NannyError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use nanny_core::{Limit, NannyConfig};
    ///
    /// let config = NannyConfig::from_toml("maxDiffTotal = 400\nexcludes = [\"*.lock\"]").unwrap();
    /// assert_eq!(config.max_diff_total, Limit::at_most(400));
    /// assert_eq!(config.excludes, vec!["*.lock"]);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, NannyError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Resolve the configuration for a watched directory.
    ///
    /// An explicit path must exist. Without one, `<root>/.diffnanny.toml`
    /// is used when present and defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`NannyError::FileNotFound`] for a missing explicit path, and
    /// the errors of [`NannyConfig::from_file`].
    pub fn load(root: &Path, explicit: Option<&Path>) -> Result<Self, NannyError> {
        match explicit {
            Some(path) if !path.exists() => Err(NannyError::FileNotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_path(root);
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    tracing::debug!(path = %default_path.display(), "no config file, using defaults");
                    Ok(Self::default())
                }
            }
        }
    }

    /// `<root>/.diffnanny.toml`.
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(CONFIG_FILE_NAME)
    }

    /// The three thresholds as a [`Limits`] value.
    pub fn limits(&self) -> Limits {
        Limits {
            max_total: self.max_diff_total,
            max_inserts: self.max_diff_inserts,
            max_removals: self.max_diff_removals,
        }
    }

    /// The base reference, with blank values treated as absent.
    pub fn base(&self) -> Option<&str> {
        self.base_branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// Timeout applied to each diff invocation.
    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs)
    }
}

/// Values supplied on the command line that take precedence over the file.
///
/// # Examples
///
/// ```
/// use nanny_core::{ConfigOverrides, Limit, NannyConfig};
///
/// let overrides = ConfigOverrides {
///     max_total: Some(100),
///     excludes: vec!["dist/**".into()],
///     ..ConfigOverrides::default()
/// };
/// let config = overrides.apply(NannyConfig::default());
/// assert_eq!(config.max_diff_total, Limit::at_most(100));
/// assert_eq!(config.excludes, vec!["dist/**"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    /// Extra exclusion patterns, appended after the configured ones.
    pub excludes: Vec<String>,
    pub max_total: Option<i64>,
    pub max_inserts: Option<i64>,
    pub max_removals: Option<i64>,
    pub base: Option<String>,
}

impl ConfigOverrides {
    /// Layer these overrides on top of `config`.
    pub fn apply(&self, mut config: NannyConfig) -> NannyConfig {
        config.excludes.extend(self.excludes.iter().cloned());
        if let Some(max) = self.max_total {
            config.max_diff_total = max.into();
        }
        if let Some(max) = self.max_inserts {
            config.max_diff_inserts = max.into();
        }
        if let Some(max) = self.max_removals {
            config.max_diff_removals = max.into();
        }
        if let Some(base) = &self.base {
            config.base_branch = Some(base.clone());
        }
        config
    }
}
