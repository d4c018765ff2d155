//! Client configuration for the remote conversion service.
//!
//! [`ClientConfig`] carries everything the request client and the upload
//! validator need: where the service lives, the bearer credential, the
//! per-request timeout, and the upload policy.
//!
//! The credential is mandatory. There is no built-in fallback key: a missing
//! key fails [`ClientConfigBuilder::build`] with
//! [`LabelZplError::MissingCredential`] before any file is touched.

use crate::error::LabelZplError;
use std::fmt;
use std::time::Duration;

/// Service base URL used when none is configured: the local API proxy.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080/api";

/// Environment variable holding the bearer credential.
pub const API_KEY_ENV: &str = "LABELZPL_API_KEY";

/// Environment variable overriding [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "LABELZPL_BASE_URL";

/// Configuration for a [`crate::pipeline::request::ConversionClient`].
///
/// # Example
/// ```rust
/// use labelzpl::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_key("secret")
///     .base_url("https://labels.example.com/api")
///     .timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.timeout.as_secs(), 10);
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    /// Prefix the endpoint paths are appended to. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Bearer credential sent in the `Authorization` header.
    pub api_key: String,

    /// Per-request timeout. Default: 30 s.
    ///
    /// A request that exceeds it is abandoned and reported as a
    /// connectivity failure for that file only.
    pub timeout: Duration,

    /// Accepted upload extensions, dot-prefixed and lower-case.
    /// Default: `.pdf`, `.png`.
    pub accepted_extensions: Vec<String>,

    /// Maximum upload size in megabytes. Default: 1.
    pub max_file_size_mb: f64,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("accepted_extensions", &self.accepted_extensions)
            .field("max_file_size_mb", &self.max_file_size_mb)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            accepted_extensions: vec![".pdf".into(), ".png".into()],
            max_file_size_mb: 1.0,
        }
    }

    /// Build from `LABELZPL_API_KEY` (required) and `LABELZPL_BASE_URL`.
    pub fn from_env() -> Result<Self, LabelZplError> {
        let mut builder = Self::builder();
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            builder = builder.api_key(key);
        }
        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            if !url.is_empty() {
                builder = builder.base_url(url);
            }
        }
        builder.build()
    }
}

/// Builder for [`ClientConfig`].
pub struct ClientConfigBuilder {
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
    accepted_extensions: Vec<String>,
    max_file_size_mb: f64,
}

impl fmt::Debug for ClientConfigBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfigBuilder")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl ClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_secs(self, secs: u64) -> Self {
        self.timeout(Duration::from_secs(secs))
    }

    /// Replace the accepted extensions. Entries are normalised to a
    /// leading dot and lower case.
    pub fn accepted_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.accepted_extensions = extensions
            .into_iter()
            .map(|e| {
                let e = e.as_ref().trim().to_lowercase();
                if e.starts_with('.') {
                    e
                } else {
                    format!(".{e}")
                }
            })
            .collect();
        self
    }

    pub fn max_file_size_mb(mut self, mb: f64) -> Self {
        self.max_file_size_mb = mb;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, LabelZplError> {
        let api_key = match self.api_key {
            Some(k) if !k.trim().is_empty() => k.trim().to_string(),
            _ => return Err(LabelZplError::MissingCredential),
        };

        let base_url = self.base_url.trim_end_matches('/').to_string();
        let parsed = reqwest::Url::parse(&base_url).map_err(|e| {
            LabelZplError::InvalidConfig(format!("base URL '{base_url}' is invalid: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(LabelZplError::InvalidConfig(format!(
                "base URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        if self.timeout.is_zero() {
            return Err(LabelZplError::InvalidConfig(
                "Timeout must be greater than zero".into(),
            ));
        }
        if !(self.max_file_size_mb.is_finite() && self.max_file_size_mb > 0.0) {
            return Err(LabelZplError::InvalidConfig(format!(
                "Maximum file size must be positive, got {}",
                self.max_file_size_mb
            )));
        }
        if self.accepted_extensions.is_empty() {
            return Err(LabelZplError::InvalidConfig(
                "At least one accepted extension is required".into(),
            ));
        }

        Ok(ClientConfig {
            base_url,
            api_key,
            timeout: self.timeout,
            accepted_extensions: self.accepted_extensions,
            max_file_size_mb: self.max_file_size_mb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::builder().api_key("k").build().unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.accepted_extensions, vec![".pdf", ".png"]);
        assert_eq!(config.max_file_size_mb, 1.0);
    }

    #[test]
    fn missing_or_blank_key_fails_fast() {
        assert!(matches!(
            ClientConfig::builder().build(),
            Err(LabelZplError::MissingCredential)
        ));
        assert!(matches!(
            ClientConfig::builder().api_key("   ").build(),
            Err(LabelZplError::MissingCredential)
        ));
    }

    #[test]
    fn rejects_bad_base_url() {
        assert!(ClientConfig::builder()
            .api_key("k")
            .base_url("not a url")
            .build()
            .is_err());
        assert!(ClientConfig::builder()
            .api_key("k")
            .base_url("ftp://example.com")
            .build()
            .is_err());
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let config = ClientConfig::builder()
            .api_key("k")
            .base_url("https://example.com/api/")
            .build()
            .unwrap();
        assert_eq!(config.base_url, "https://example.com/api");
    }

    #[test]
    fn extensions_are_normalised() {
        let config = ClientConfig::builder()
            .api_key("k")
            .accepted_extensions(["PDF", ".Png"])
            .build()
            .unwrap();
        assert_eq!(config.accepted_extensions, vec![".pdf", ".png"]);
    }

    #[test]
    fn debug_redacts_key() {
        let config = ClientConfig::builder().api_key("super-secret").build().unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("super-secret"));
        assert!(dbg.contains("redacted"));
    }

    #[test]
    fn zero_timeout_is_invalid() {
        assert!(ClientConfig::builder()
            .api_key("k")
            .timeout(Duration::ZERO)
            .build()
            .is_err());
    }
}
