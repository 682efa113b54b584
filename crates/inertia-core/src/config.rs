//! Engine configuration.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Address the SSR sidecar listens on unless told otherwise.
pub const DEFAULT_SSR_URL: &str = "http://127.0.0.1:13714";

/// Configuration for the negotiation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InertiaConfig {
    /// Public base URL, prefixed to the request URI on forced reloads.
    #[serde(default)]
    pub url: String,

    /// Path of the root HTML template.
    pub root_template: String,

    /// Current asset version.
    #[serde(default)]
    pub version: String,

    /// Server-side rendering sidecar, if enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssr: Option<SsrConfig>,
}

impl InertiaConfig {
    /// Create a new configuration.
    pub fn new(
        url: impl Into<String>,
        root_template: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            root_template: root_template.into(),
            version: version.into(),
            ssr: None,
        }
    }

    /// Enable server-side rendering.
    pub fn with_ssr(mut self, ssr: SsrConfig) -> Self {
        self.ssr = Some(ssr);
        self
    }

    /// Set the asset version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Load config from a TOML file, or JSON if the path ends in `.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))?
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration for values that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.root_template.trim().is_empty() {
            bail!("root_template must not be empty");
        }
        if http::HeaderValue::from_str(&self.url).is_err() {
            bail!("url is not usable in a response header: {:?}", self.url);
        }
        if let Some(ssr) = &self.ssr {
            ssr.validate()?;
        }
        Ok(())
    }
}

/// SSR sidecar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SsrConfig {
    /// Sidecar base URL, with or without the trailing `/render`.
    #[serde(default = "default_ssr_url")]
    pub url: String,

    /// Total time allowed for one render call.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Time allowed to establish the connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_ssr_url() -> String {
    DEFAULT_SSR_URL.to_string()
}

fn default_timeout_ms() -> u64 {
    1500
}

fn default_connect_timeout_ms() -> u64 {
    250
}

fn ceil_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos().div_ceil(1_000_000)).unwrap_or(u64::MAX)
}

impl Default for SsrConfig {
    fn default() -> Self {
        Self {
            url: default_ssr_url(),
            timeout_ms: default_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

impl SsrConfig {
    /// Create a configuration for the given sidecar URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the total timeout, rounded up to whole milliseconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = ceil_millis(timeout);
        self
    }

    /// Set the connect timeout, rounded up to whole milliseconds.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = ceil_millis(timeout);
        self
    }

    /// Check the sidecar settings for values that can never work.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("ssr.url must not be empty");
        }
        if self.timeout_ms == 0 {
            bail!("ssr.timeout_ms must be greater than zero");
        }
        Ok(())
    }

    /// Total timeout as a duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Connect timeout as a duration.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "inertia-config-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_ssr_config_default() {
        let ssr = SsrConfig::default();

        assert_eq!(ssr.url, "http://127.0.0.1:13714");
        assert_eq!(ssr.timeout(), Duration::from_millis(1500));
        assert_eq!(ssr.connect_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_config_builder_chain() {
        let config = InertiaConfig::new("https://app.test", "app.html", "1")
            .with_version("2")
            .with_ssr(SsrConfig::new("http://ssr:13714").with_timeout(Duration::from_secs(2)));

        assert_eq!(config.version, "2");
        let ssr = config.ssr.unwrap();
        assert_eq!(ssr.url, "http://ssr:13714");
        assert_eq!(ssr.timeout_ms, 2000);
    }

    // === Loading Tests ===

    #[test]
    fn test_load_toml() {
        let path = write_temp(
            "app.toml",
            r#"
url = "https://app.test"
root_template = "resources/app.html"
version = "abc123"

[ssr]
url = "http://127.0.0.1:13714/render"
"#,
        );

        let config = InertiaConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.url, "https://app.test");
        assert_eq!(config.root_template, "resources/app.html");
        assert_eq!(config.version, "abc123");
        let ssr = config.ssr.unwrap();
        assert_eq!(ssr.url, "http://127.0.0.1:13714/render");
        assert_eq!(ssr.timeout_ms, 1500);
    }

    #[test]
    fn test_load_json() {
        let path = write_temp(
            "app.json",
            r#"{"root_template": "app.html", "version": "7"}"#,
        );

        let config = InertiaConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.root_template, "app.html");
        assert_eq!(config.version, "7");
        assert_eq!(config.url, "");
        assert!(config.ssr.is_none());
    }

    #[test]
    fn test_load_missing_file() {
        let err = InertiaConfig::load("/nonexistent/inertia.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_validate_rejects_empty_template() {
        let config = InertiaConfig::new("", " ", "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_ssr_timeout() {
        let mut ssr = SsrConfig::default();
        ssr.timeout_ms = 0;
        let config = InertiaConfig::new("", "app.html", "").with_ssr(ssr);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_url_unfit_for_header() {
        let config = InertiaConfig::new("https://app.test/\n", "app.html", "");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ssr_validate() {
        assert!(SsrConfig::default().validate().is_ok());
        assert!(SsrConfig::new("").validate().is_err());
        assert!(SsrConfig::default()
            .with_timeout(Duration::ZERO)
            .validate()
            .is_err());
    }

    #[test]
    fn test_sub_millisecond_timeout_rounds_up() {
        let ssr = SsrConfig::default().with_timeout(Duration::from_micros(500));
        assert_eq!(ssr.timeout_ms, 1);
        assert!(ssr.validate().is_ok());

        let ssr = SsrConfig::default().with_connect_timeout(Duration::from_micros(1500));
        assert_eq!(ssr.connect_timeout_ms, 2);
    }
}
