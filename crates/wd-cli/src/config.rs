//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use wd_core::{AllocationConfig, DEFAULT_MAX_ENTRIES, RemainderPolicy};

/// Model used for complexity scoring unless configured otherwise.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Claude API key. Smart mode falls back to heuristic weights without it.
    pub api_key: Option<String>,

    /// Claude model used for scoring.
    pub model: String,

    /// Maximum entries per distribution.
    pub max_entries: usize,

    /// Who receives the minutes lost to rounding.
    pub remainder_policy: RemainderPolicy,

    /// Scoring request timeout in seconds.
    pub timeout_secs: u64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("max_entries", &self.max_entries)
            .field("remainder_policy", &self.remainder_policy)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_entries: DEFAULT_MAX_ENTRIES,
            remainder_policy: RemainderPolicy::default(),
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// Loads configuration from the default location, then `config_path` if
    /// given, then `WD_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WD_*)
        figment = figment.merge(Env::prefixed("WD_"));

        figment.extract()
    }

    /// Allocation settings derived from this configuration.
    pub const fn allocation(&self) -> AllocationConfig {
        AllocationConfig {
            max_entries: self.max_entries,
            remainder_policy: self.remainder_policy,
        }
    }

    /// The API key, if set to something non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Returns the platform-specific config directory for wd.
///
/// On Linux: `~/.config/wd`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wd"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_config_path_ends_with_wd() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "wd");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_entries, 50);
        assert_eq!(config.remainder_policy, RemainderPolicy::Weight);
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = Config {
            api_key: Some("sk-ant-secret".to_string()),
            ..Config::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-ant-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = Config {
            api_key: Some("   ".to_string()),
            ..Config::default()
        };
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("wd.toml");
        std::fs::write(
            &path,
            "model = \"claude-haiku\"\nmax_entries = 10\nremainder_policy = \"fraction\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(&path)).unwrap();
        assert_eq!(config.model, "claude-haiku");
        assert_eq!(config.allocation().max_entries, 10);
        assert_eq!(config.allocation().remainder_policy, RemainderPolicy::Fraction);
    }
}
