use anyhow::{Context, Result, bail};
use pkgkit::RetryConfig;
use pkgkit::backend::dnf::DnfOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SYSTEM_CONFIG: &str = "/etc/ralpkg/config.toml";

// ============================================================================
// Provider Config
// ============================================================================

/// Provider configuration, read from TOML
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Log filter used when no `-v` is given (env_logger syntax)
    #[serde(default)]
    pub log_level: Option<String>,

    /// How to run dnf
    #[serde(default)]
    pub dnf: DnfConfig,

    /// Retry policy for package downloads
    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnfConfig {
    #[serde(default = "default_binary")]
    pub binary: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
    /// Never refresh repository metadata
    #[serde(default)]
    pub cache_only: bool,
}

impl Default for DnfConfig {
    fn default() -> Self {
        Self {
            binary: default_binary(),
            extra_args: Vec::new(),
            cache_only: false,
        }
    }
}

fn default_binary() -> String {
    "dnf".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,
    #[serde(default = "default_backoff")]
    pub backoff_factor: f64,
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay(),
            backoff_factor: default_backoff(),
            max_delay_secs: default_max_delay(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay() -> u64 {
    5
}

fn default_backoff() -> f64 {
    2.0
}

fn default_max_delay() -> u64 {
    120
}

impl Config {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise the system file is tried, then
    /// the per-user file; defaults are used when neither exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        Self::load_from(&path)
    }

    /// First existing config file among the default locations.
    pub fn default_path() -> Option<PathBuf> {
        let user = dirs::config_dir().map(|d| d.join("ralpkg").join("config.toml"));
        std::iter::once(PathBuf::from(SYSTEM_CONFIG))
            .chain(user)
            .find(|p| p.exists())
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid TOML format in {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.dnf.binary.trim().is_empty() {
            bail!("dnf.binary cannot be empty");
        }

        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }

        if !self.retry.backoff_factor.is_finite() || self.retry.backoff_factor < 1.0 {
            bail!(
                "retry.backoff_factor must be a number >= 1.0, got {}",
                self.retry.backoff_factor
            );
        }

        Ok(())
    }

    /// Options for the dnf backend
    pub fn dnf_options(&self) -> DnfOptions {
        DnfOptions {
            binary: self.dnf.binary.clone(),
            extra_args: self.dnf.extra_args.clone(),
            cache_only: self.dnf.cache_only,
        }
    }

    /// Download retry policy
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.retry.max_attempts,
            base_delay: Duration::from_secs(self.retry.base_delay_secs),
            backoff_factor: self.retry.backoff_factor,
            max_delay: Duration::from_secs(self.retry.max_delay_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dnf_options().binary, "dnf");
        assert_eq!(config.retry_config(), RetryConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let file = write_config(
            r#"
log_level = "debug"

[dnf]
extra_args = ["--setopt=install_weak_deps=False"]
cache_only = true

[retry]
max_attempts = 5
"#,
        );

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.dnf.binary, "dnf");
        assert!(config.dnf_options().cache_only);
        assert_eq!(config.dnf.extra_args.len(), 1);

        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.base_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_invalid_values() {
        let empty_binary = write_config("[dnf]\nbinary = \"  \"\n");
        assert!(Config::load_from(empty_binary.path()).is_err());

        let zero_attempts = write_config("[retry]\nmax_attempts = 0\n");
        assert!(Config::load_from(zero_attempts.path()).is_err());

        let shrinking = write_config("[retry]\nbackoff_factor = 0.5\n");
        assert!(Config::load_from(shrinking.path()).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(Config::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("[dnf\nbinary = ");
        let err = Config::load_from(file.path()).unwrap_err();
        assert!(err.to_string().contains("Invalid TOML format"));
    }
}
