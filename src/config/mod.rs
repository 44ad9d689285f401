//! Configuration for the DAM scheme, loaded from TOML and overridable from
//! the command line or environment.
//!
//! ```toml
//! scheme = "dam"
//! base_url = "https://dam.example.com/files/"
//! upload_endpoint = "https://dam.example.com/api/upload"
//! timeout = "30s"
//!
//! [[derivatives]]
//! segment = "styles"
//! public_url = "https://dam.example.com/public/"
//! ```

pub mod duration;

use anyhow::{Context, Result};
use clap::Parser;
use dam_remote_file::{ReqwestClient, UrlTranslator};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use duration::parse_duration;

/// Default URI scheme name
pub const DEFAULT_SCHEME: &str = "dam";

/// Public location of one family of size variants
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DerivativeConfig {
    /// First path segment that marks a derivative URI (`dam://<segment>/...`)
    pub segment: String,
    /// URL that replaces `dam://<segment>/`
    pub public_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DamConfig {
    pub scheme: String,
    /// URL that replaces `dam://` for original assets
    pub base_url: String,
    pub derivatives: Vec<DerivativeConfig>,
    pub upload_endpoint: Option<String>,
    /// HTTP request timeout, e.g. "30s". Unset keeps the client default.
    pub timeout: Option<String>,
}

impl Default for DamConfig {
    fn default() -> Self {
        Self {
            scheme: DEFAULT_SCHEME.to_string(),
            base_url: String::new(),
            derivatives: Vec::new(),
            upload_endpoint: None,
            timeout: None,
        }
    }
}

impl DamConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse DAM configuration")
    }

    /// Read a TOML configuration file
    pub async fn load(path: &Path) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Check that the configuration can build a working translator
    pub fn validate(&self) -> Result<()> {
        if self.scheme.is_empty()
            || !self
                .scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            anyhow::bail!("Invalid scheme name: '{}'", self.scheme);
        }
        check_http_url("base_url", &self.base_url)?;
        for derivative in &self.derivatives {
            if derivative.segment.trim_matches('/').is_empty() {
                anyhow::bail!("Derivative segment must not be empty");
            }
            check_http_url("derivatives.public_url", &derivative.public_url)?;
        }
        if let Some(endpoint) = &self.upload_endpoint {
            check_http_url("upload_endpoint", endpoint)?;
        }
        self.timeout()?;
        Ok(())
    }

    /// Rewrite rules: derivatives in file order, then the base URL
    pub fn translator(&self) -> UrlTranslator {
        self.derivatives
            .iter()
            .fold(UrlTranslator::new(&self.scheme, &self.base_url), |t, d| {
                t.with_derivative(&d.segment, &d.public_url)
            })
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(parse_duration)
            .transpose()
            .context("Invalid timeout")
    }

    pub fn http_client(&self) -> Result<ReqwestClient> {
        match self.timeout()? {
            Some(timeout) => ReqwestClient::with_timeout(timeout),
            None => Ok(ReqwestClient::new()),
        }
    }
}

fn check_http_url(field: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        anyhow::bail!("{field} must be an http:// or https:// URL, got '{url}'")
    }
}

/// Command-line and environment options
#[derive(Parser, Clone, Debug, Default)]
pub struct DamOpts {
    /// Path to a TOML configuration file
    #[arg(long, env = "DAM_CONFIG")]
    pub config: Option<PathBuf>,

    /// URI scheme name (default: "dam")
    #[arg(long, env = "DAM_SCHEME")]
    pub scheme: Option<String>,

    /// Base URL serving original assets
    #[arg(long, env = "DAM_BASE_URL")]
    pub base_url: Option<String>,

    /// DAM upload endpoint
    #[arg(long, env = "DAM_UPLOAD_ENDPOINT")]
    pub upload_endpoint: Option<String>,

    /// HTTP request timeout (e.g. "30s", "500ms")
    #[arg(long, env = "DAM_TIMEOUT")]
    pub timeout: Option<String>,
}

impl DamOpts {
    /// Load the config file (if any), apply overrides and validate
    pub async fn resolve(&self) -> Result<DamConfig> {
        let mut config = match &self.config {
            Some(path) => DamConfig::load(path).await?,
            None => DamConfig::default(),
        };
        self.apply(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply(&self, config: &mut DamConfig) {
        if let Some(scheme) = &self.scheme {
            config.scheme = scheme.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(endpoint) = &self.upload_endpoint {
            config.upload_endpoint = Some(endpoint.clone());
        }
        if let Some(timeout) = &self.timeout {
            config.timeout = Some(timeout.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
scheme = "scheme"
base_url = "http://host/files/"
upload_endpoint = "http://host/api/upload"
timeout = "30s"

[[derivatives]]
segment = "stylebucket"
public_url = "http://host/public/"
"#;

    #[test]
    fn test_parse_config() {
        let config = DamConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.scheme, "scheme");
        assert_eq!(config.derivatives.len(), 1);
        assert_eq!(config.timeout().unwrap(), Some(Duration::from_secs(30)));
        config.validate().unwrap();
    }

    #[test]
    fn test_translator_from_config() {
        let translator = DamConfig::from_toml_str(SAMPLE).unwrap().translator();
        assert_eq!(
            translator.translate("scheme://images/photo.jpg").unwrap(),
            "http://host/files/images/photo.jpg"
        );
        assert_eq!(
            translator
                .translate("scheme://stylebucket/thumb/photo.jpg")
                .unwrap(),
            "http://host/public/thumb/photo.jpg"
        );
    }

    #[test]
    fn test_defaults() {
        let config = DamConfig::from_toml_str(r#"base_url = "https://dam.example.com""#).unwrap();
        assert_eq!(config.scheme, DEFAULT_SCHEME);
        assert!(config.derivatives.is_empty());
        assert_eq!(config.upload_endpoint, None);
        assert_eq!(config.timeout().unwrap(), None);
        config.validate().unwrap();
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(DamConfig::from_toml_str("base_urll = \"http://x\"").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = DamConfig::from_toml_str(SAMPLE).unwrap();
        config.base_url = "ftp://host/files/".to_string();
        assert!(config.validate().is_err());

        let mut config = DamConfig::from_toml_str(SAMPLE).unwrap();
        config.scheme = "bad scheme".to_string();
        assert!(config.validate().is_err());

        let mut config = DamConfig::from_toml_str(SAMPLE).unwrap();
        config.timeout = Some("soon".to_string());
        assert!(config.validate().is_err());

        assert!(DamConfig::default().validate().is_err());
    }

    #[tokio::test]
    async fn test_opts_override_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("dam.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let opts = DamOpts {
            config: Some(path),
            base_url: Some("https://cdn.example.com/originals".to_string()),
            ..Default::default()
        };
        let config = opts.resolve().await.unwrap();

        assert_eq!(config.scheme, "scheme");
        assert_eq!(config.base_url, "https://cdn.example.com/originals");
        assert_eq!(
            config.translator().translate("scheme://a.txt").unwrap(),
            "https://cdn.example.com/originals/a.txt"
        );
    }

    #[tokio::test]
    async fn test_opts_without_file() {
        let opts = DamOpts {
            base_url: Some("http://host/files/".to_string()),
            ..Default::default()
        };
        let config = opts.resolve().await.unwrap();
        assert_eq!(config.scheme, DEFAULT_SCHEME);

        let missing = DamOpts {
            config: Some(PathBuf::from("/nonexistent/dam.toml")),
            ..Default::default()
        };
        assert!(missing.resolve().await.is_err());
    }
}
