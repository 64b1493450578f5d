//! Backend endpoint configuration.

use url::Url;

use crate::error::ConfigError;

/// Environment variable holding the backend base url.
pub const BACKEND_URL_VAR: &str = "SKETCHML_BACKEND_URL";

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Where the fitting service lives. The channel url is derived from the
/// http base by switching `http` → `ws` and `https` → `wss`.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    http_base: Url,
    ws_base: Url,
}

impl BackendConfig {
    pub fn from_url(raw: &str) -> Result<Self, ConfigError> {
        let http_base = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        if http_base.host_str().is_none() {
            return Err(ConfigError::MissingHost(raw.to_string()));
        }
        let ws_scheme = match http_base.scheme() {
            "http" => "ws",
            "https" => "wss",
            other => return Err(ConfigError::UnsupportedScheme(other.to_string())),
        };
        let mut ws_base = http_base.clone();
        ws_base
            .set_scheme(ws_scheme)
            .map_err(|()| ConfigError::UnsupportedScheme(ws_scheme.to_string()))?;
        Ok(Self { http_base, ws_base })
    }

    /// Reads [`BACKEND_URL_VAR`], falling back to [`DEFAULT_BACKEND_URL`].
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(BACKEND_URL_VAR) {
            Ok(raw) if !raw.trim().is_empty() => Self::from_url(raw.trim()),
            _ => Self::from_url(DEFAULT_BACKEND_URL),
        }
    }

    pub fn http_base(&self) -> &Url {
        &self.http_base
    }

    pub fn ws_base(&self) -> &Url {
        &self.ws_base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_mapping() {
        let local = BackendConfig::from_url("http://localhost:8000").unwrap();
        assert_eq!(local.ws_base().as_str(), "ws://localhost:8000/");

        let prod = BackendConfig::from_url("https://example.org").unwrap();
        assert_eq!(prod.ws_base().as_str(), "wss://example.org/");
        assert_eq!(prod.http_base().as_str(), "https://example.org/");
    }

    #[test]
    fn test_rejects_bad_urls() {
        assert!(matches!(
            BackendConfig::from_url("ftp://example.org"),
            Err(ConfigError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            BackendConfig::from_url("not a url"),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }
}
