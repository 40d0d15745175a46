use crate::session::SessionConfig;
use crate::speech::SpeechConfig;
use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable prefix, e.g. `LINGO__API__BASE_URL`
pub const ENV_PREFIX: &str = "LINGO";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub session: SessionConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server origin, without the `/api/v1` prefix
    pub base_url: String,
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 30_000,
        }
    }
}

impl Config {
    /// Load defaults, then the optional config file at `path` (any extension
    /// the `config` crate knows), then `LINGO__*` environment variables
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read config {}", path))?;

        settings
            .try_deserialize()
            .context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path().join("absent").to_str().unwrap()).unwrap();

        assert_eq!(cfg.api.base_url, "http://localhost:8000");
        assert_eq!(cfg.session.token_key, "token");
        assert_eq!(cfg.speech.language, "en-US");
        assert_eq!(cfg.speech.restart_delay_ms, 100);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("lingo.toml");
        std::fs::write(
            &path,
            "[api]\nbase_url = \"https://practice.example.com\"\n\n[speech]\nlanguage = \"ja-JP\"\n",
        )
        .unwrap();

        let cfg = Config::load(path.with_extension("").to_str().unwrap()).unwrap();

        assert_eq!(cfg.api.base_url, "https://practice.example.com");
        assert_eq!(cfg.api.timeout_ms, 30_000);
        assert_eq!(cfg.speech.language, "ja-JP");
        assert!(cfg.speech.continuous);
    }
}
