//! ClickHouse configuration.

use activity_core::{Error, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// ClickHouse client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClickHouseConfig {
    /// ClickHouse HTTP address; `host:port` is accepted and gets `http://`
    #[serde(default)]
    pub url: String,
    /// Database name
    #[serde(default = "default_database")]
    pub database: String,
    /// Username (optional)
    pub username: Option<String>,
    /// Password (optional)
    pub password: Option<String>,
}

fn default_database() -> String {
    "default".to_string()
}

impl ClickHouseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            database: default_database(),
            username: None,
            password: None,
        }
    }

    /// Returns the validated HTTP endpoint.
    pub fn endpoint(&self) -> Result<Url> {
        let raw = self.url.trim();
        if raw.is_empty() {
            return Err(Error::config("ClickHouse address is not set"));
        }

        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{}", raw)
        };

        let url = Url::parse(&with_scheme)
            .map_err(|e| Error::config(format!("Invalid ClickHouse address '{}': {}", raw, e)))?;

        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(Error::config(format!(
                    "Unsupported ClickHouse scheme '{}', expected http or https",
                    other
                )))
            }
        }
        if url.host_str().is_none() {
            return Err(Error::config(format!("ClickHouse address '{}' has no host", raw)));
        }

        Ok(url)
    }

    /// Checks the required settings.
    pub fn validate(&self) -> Result<()> {
        self.endpoint()?;
        if self.database.trim().is_empty() {
            return Err(Error::config("ClickHouse database is empty"));
        }
        Ok(())
    }
}
