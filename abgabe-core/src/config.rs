//! YAML configuration.
//!
//! # Storage layout
//!
//! ```text
//! ~/.abgabesystem/
//!   config.yaml     (url, private_token, ldap settings, checker settings)
//! ```
//!
//! A missing file is not an error: every setting has a default or can be
//! supplied through the environment (`ABGABE_GITLAB_URL`,
//! `ABGABE_GITLAB_TOKEN`) or on the command line.
//!
//! # API pattern
//!
//! - `fn_at(home: &Path, …)` — explicit home; used in tests with `TempDir`
//! - `fn(…)` — derives home from `dirs::home_dir()`, delegates to `_at`

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const ENV_URL: &str = "ABGABE_GITLAB_URL";
pub const ENV_TOKEN: &str = "ABGABE_GITLAB_TOKEN";

/// Settings for the external plagiarism checker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    /// Java launcher used to run the checker jar.
    pub java: String,
    /// Language mode passed with `-p`.
    pub language: String,
    /// Language version passed with `-l`.
    pub language_version: String,
    /// Result directory passed with `-r`.
    pub results_dir: PathBuf,
    /// Directory the submissions are cloned into.
    pub workdir: PathBuf,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            java: "java".to_string(),
            language: "java".to_string(),
            language_version: "java17".to_string(),
            results_dir: PathBuf::from("results"),
            workdir: PathBuf::from("input"),
        }
    }
}

/// Full tool configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the GitLab instance, e.g. `https://gitlab.example.org`.
    pub url: Option<String>,
    /// Personal access token with `api` scope (admin for user creation).
    pub private_token: Option<String>,
    /// Base DN the dummy accounts' extern uid is built from.
    pub ldap_base: Option<String>,
    /// Name of the LDAP provider configured on the instance.
    pub ldap_provider: String,
    /// Connect and read timeout for API calls.
    pub timeout_secs: u64,
    pub checker: CheckerConfig,

    /// File the configuration was read from (or would have been).
    #[serde(skip)]
    pub source: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            private_token: None,
            ldap_base: None,
            ldap_provider: "ldapmain".to_string(),
            timeout_secs: 30,
            checker: CheckerConfig::default(),
            source: PathBuf::new(),
        }
    }
}

/// `<home>/.abgabesystem/config.yaml` — pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".abgabesystem").join("config.yaml")
}

/// Load `<home>/.abgabesystem/config.yaml`, or defaults if it does not exist.
pub fn load_at(home: &Path) -> Result<Config, ConfigError> {
    load_from(&config_path_at(home))
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Config, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    load_at(&home)
}

/// Load an explicit config file. A missing file yields defaults.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str::<Config>(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    } else {
        Config::default()
    };
    config.source = path.to_path_buf();
    Ok(config)
}

impl Config {
    /// Apply environment overrides. `lookup` is `std::env::var(..).ok()` in
    /// production and a map lookup in tests.
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_URL).filter(|v| !v.is_empty()) {
            self.url = Some(url);
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.private_token = Some(token);
        }
        self
    }

    /// The configured URL without trailing slashes.
    pub fn require_url(&self) -> Result<String, ConfigError> {
        self.url
            .as_deref()
            .map(|u| u.trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| self.missing("url", ENV_URL))
    }

    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.private_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| self.missing("private_token", ENV_TOKEN))
    }

    pub fn require_ldap_base(&self) -> Result<&str, ConfigError> {
        self.ldap_base
            .as_deref()
            .filter(|b| !b.is_empty())
            .ok_or_else(|| self.missing("ldap_base", "--ldap-base"))
    }

    fn missing(&self, key: &'static str, env: &'static str) -> ConfigError {
        ConfigError::Missing {
            key,
            path: self.source.clone(),
            env,
        }
    }
}
