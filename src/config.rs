use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const CONFIG_FILE_NAME: &str = "config.toml";
const ENV_CONFIG_PATH: &str = "UNDERTONE_CONFIG_PATH";
const ENV_BACKEND_URL: &str = "UNDERTONE_BACKEND_URL";
const ENV_POLL_INTERVAL: &str = "UNDERTONE_POLL_INTERVAL_MS";

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_SUBMIT_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_POLL_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    backend_url: String,
    submit_timeout_ms: u64,
    poll_timeout_ms: u64,
    poll_interval_ms: u64,
}

impl ClientConfig {
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = config_file_override()? {
            if path.exists() {
                config.apply_partial(read_partial(&path)?);
            }
        } else {
            let path = Self::default_config_path()?;
            if path.exists() {
                config.apply_partial(read_partial(&path)?);
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    pub fn submit_timeout_ms(&self) -> u64 {
        self.submit_timeout_ms
    }

    pub fn poll_timeout_ms(&self) -> u64 {
        self.poll_timeout_ms
    }

    pub fn poll_interval_ms(&self) -> u64 {
        self.poll_interval_ms
    }

    /// Override the poll cadence. Tests shorten it; the plugin keeps the
    /// default 3 s.
    pub fn with_poll_interval_ms(mut self, interval_ms: u64) -> Self {
        self.poll_interval_ms = interval_ms;
        self
    }

    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "Undertone", "Undertone")
            .ok_or_else(|| anyhow!("unable to determine config directory"))?;
        Ok(dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    fn apply_partial(&mut self, partial: PartialConfig) {
        if let Some(url) = partial.backend_url {
            self.backend_url = url;
        }
        if let Some(ms) = partial.submit_timeout_ms {
            self.submit_timeout_ms = ms;
        }
        if let Some(ms) = partial.poll_timeout_ms {
            self.poll_timeout_ms = ms;
        }
        if let Some(ms) = partial.poll_interval_ms {
            self.poll_interval_ms = ms;
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = env::var(ENV_BACKEND_URL) {
            if !value.trim().is_empty() {
                self.backend_url = value;
            }
        }
        if let Ok(value) = env::var(ENV_POLL_INTERVAL) {
            if !value.trim().is_empty() {
                self.poll_interval_ms = value
                    .parse::<u64>()
                    .context("UNDERTONE_POLL_INTERVAL_MS must be an integer of milliseconds")?;
            }
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.into(),
            submit_timeout_ms: DEFAULT_SUBMIT_TIMEOUT_MS,
            poll_timeout_ms: DEFAULT_POLL_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

fn config_file_override() -> Result<Option<PathBuf>> {
    if let Some(value) = env::var_os(ENV_CONFIG_PATH) {
        if value.is_empty() {
            return Ok(None);
        }
        let path = PathBuf::from(value);
        if path.is_dir() {
            return Ok(Some(path.join(CONFIG_FILE_NAME)));
        }
        return Ok(Some(path));
    }
    Ok(None)
}

fn read_partial(path: &Path) -> Result<PartialConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let partial: PartialConfig =
        toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))?;
    Ok(partial)
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct PartialConfig {
    backend_url: Option<String>,
    submit_timeout_ms: Option<u64>,
    poll_timeout_ms: Option<u64>,
    poll_interval_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_protocol_cadence() {
        let config = ClientConfig::default();
        assert_eq!(config.submit_timeout_ms(), 30_000);
        assert_eq!(config.poll_timeout_ms(), 10_000);
        assert_eq!(config.poll_interval_ms(), 3_000);
    }

    #[test]
    fn partial_overrides_apply() {
        let partial: PartialConfig =
            toml::from_str("backend_url = \"http://studio:9000\"\npoll_interval_ms = 500").unwrap();
        let mut config = ClientConfig::default();
        config.apply_partial(partial);
        assert_eq!(config.backend_url(), "http://studio:9000");
        assert_eq!(config.poll_interval_ms(), 500);
        assert_eq!(config.submit_timeout_ms(), 30_000);
    }
}
