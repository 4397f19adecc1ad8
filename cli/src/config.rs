// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! CLI configuration loading
//!
//! Precedence, highest first:
//! 1. `AGNT_*` environment variables
//! 2. Config file (`--config <FILE>`, else `~/.agnt/config.yaml`)
//! 3. Built-in defaults

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: i64 = 30;
pub const DEFAULT_OUTPUT_FORMAT: &str = "json";

const ENV_PREFIX: &str = "AGNT_";

/// Environment snapshot used for config resolution.
///
/// Holds only the values the loader reads, so tests build one explicitly
/// instead of mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigEnv {
    vars: HashMap<String, String>,
    home: Option<PathBuf>,
}

impl ConfigEnv {
    pub fn new(home: Option<PathBuf>) -> Self {
        Self {
            vars: HashMap::new(),
            home,
        }
    }

    /// Capture `AGNT_*` variables and the user's home directory.
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars()
                .filter(|(key, _)| key.starts_with(ENV_PREFIX))
                .collect(),
            home: dirs::home_dir(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Set and non-blank values only; an empty variable counts as unset.
    fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|val| !val.trim().is_empty())
    }

    pub fn home_dir(&self) -> Option<&Path> {
        self.home.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_seconds: i64,
    pub auth_token: Option<String>,
    pub output_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECS,
            auth_token: None,
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
        }
    }
}

impl Config {
    /// `~/.agnt/config.yaml`
    pub fn default_path(env: &ConfigEnv) -> Result<PathBuf> {
        let home = env
            .home_dir()
            .context("resolve home directory: home directory is not set")?;
        Ok(home.join(".agnt").join("config.yaml"))
    }

    /// Load configuration, merge environment overrides and validate.
    ///
    /// An explicit path must exist. The default path is optional and a
    /// missing file there falls back to defaults.
    pub fn load(config_path: Option<&Path>, env: &ConfigEnv) -> Result<Self> {
        let (path, explicit) = match config_path {
            Some(path) if !path.as_os_str().is_empty() => (path.to_path_buf(), true),
            _ => (Self::default_path(env)?, false),
        };

        let mut config = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                debug!("Loading configuration from {:?}", path);
                Self::from_yaml_str(&contents)
                    .with_context(|| format!("read config file {:?}", path))?
            }
            Err(e) if !explicit && e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration file at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read config file {:?}", path));
            }
        };

        config.apply_env_overrides(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config = serde_yaml::from_str(yaml).context("decode config")?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self, env: &ConfigEnv) -> Result<()> {
        if let Some(val) = env.var("AGNT_API_BASE_URL") {
            debug!("Environment override: AGNT_API_BASE_URL={}", val);
            self.api_base_url = val.to_string();
        }

        if let Some(val) = env.var("AGNT_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = val.trim().parse().with_context(|| {
                format!("decode config: invalid AGNT_REQUEST_TIMEOUT_SECONDS {:?}", val)
            })?;
        }

        if let Some(val) = env.var("AGNT_AUTH_TOKEN") {
            self.auth_token = Some(val.to_string());
        }

        if let Some(val) = env.var("AGNT_OUTPUT_FORMAT") {
            self.output_format = val.to_string();
        }

        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        if self.request_timeout_seconds <= 0 {
            bail!("request_timeout_seconds must be greater than 0");
        }

        if !self.output_format.eq_ignore_ascii_case(DEFAULT_OUTPUT_FORMAT) {
            bail!("output_format must be json");
        }
        self.output_format = DEFAULT_OUTPUT_FORMAT.to_string();

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.unsigned_abs())
    }

    /// Bearer token, if one is configured and non-blank.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token
            .as_deref()
            .filter(|token| !token.trim().is_empty())
    }
}
