use std::fs;

use anyhow::{bail, Result};
use serde::Deserialize;
use url::Url;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server_url: String,
    pub database_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8080".into(),
            database_url: "sqlite://./data/taskhub.db".into(),
        }
    }
}

/// Defaults, overridden by `taskhub.toml`, overridden by environment.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("taskhub.toml") {
        if let Ok(file_cfg) = toml::from_str::<Settings>(&raw) {
            settings = file_cfg;
        }
    }

    if let Ok(v) = std::env::var("TASKHUB_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("TASKHUB_DATABASE_URL") {
        settings.database_url = v;
    }

    settings
}

/// Accepts http(s) URLs only and strips any trailing slash so endpoint
/// paths can be appended directly.
pub fn validate_server_url(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(parsed) => parsed,
        Err(err) => bail!("invalid server url '{trimmed}': {err}"),
    };
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        bail!(
            "server url '{trimmed}' must use http or https, got '{}'",
            parsed.scheme()
        );
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_server_and_database() {
        let settings = Settings::default();
        assert_eq!(settings.server_url, "http://127.0.0.1:8080");
        assert_eq!(settings.database_url, "sqlite://./data/taskhub.db");
    }

    #[test]
    fn accepts_http_and_https_urls() {
        assert_eq!(
            validate_server_url("http://localhost:8080").expect("http"),
            "http://localhost:8080"
        );
        assert_eq!(
            validate_server_url("https://tasks.example.com/").expect("https"),
            "https://tasks.example.com"
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        assert!(validate_server_url("ftp://tasks.example.com").is_err());
        assert!(validate_server_url("not a url").is_err());
    }

    #[test]
    fn parses_partial_settings_file() {
        let settings: Settings =
            toml::from_str(r#"server_url = "https://tasks.example.com""#).expect("toml");
        assert_eq!(settings.server_url, "https://tasks.example.com");
        assert_eq!(settings.database_url, "sqlite://./data/taskhub.db");
    }
}
