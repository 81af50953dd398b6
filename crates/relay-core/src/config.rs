//! Remote endpoint configuration.

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

/// Connection settings for the remote document store.
///
/// The base URL is the collection root; documents live at
/// `{base_url}/{collection}/{id}`. The auth token, when present, is sent
/// as a bearer credential on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    base_url: String,
    auth_token: Option<String>,
}

impl RemoteConfig {
    /// Create a validated remote configuration.
    ///
    /// The base URL must include an `http://` or `https://` scheme; a
    /// trailing slash is stripped. Blank auth tokens are treated as absent.
    pub fn new(base_url: impl Into<String>, auth_token: Option<String>) -> Result<Self> {
        let base_url = normalize_text_option(Some(base_url.into()))
            .ok_or_else(|| Error::InvalidInput("remote base URL must not be empty".to_string()))?;
        if !is_http_url(&base_url) {
            return Err(Error::InvalidInput(
                "remote base URL must include http:// or https://".to_string(),
            ));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: normalize_text_option(auth_token),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_schemeless_urls() {
        assert!(RemoteConfig::new("   ", None).is_err());
        assert!(RemoteConfig::new("api.example.com", None).is_err());
    }

    #[test]
    fn strips_trailing_slash() {
        let config = RemoteConfig::new("https://api.example.com/", None).unwrap();
        assert_eq!(config.base_url(), "https://api.example.com");
    }

    #[test]
    fn blank_auth_token_is_absent() {
        let config = RemoteConfig::new("https://api.example.com", Some("  ".to_string())).unwrap();
        assert_eq!(config.auth_token(), None);

        let config =
            RemoteConfig::new("https://api.example.com", Some(" token ".to_string())).unwrap();
        assert_eq!(config.auth_token(), Some("token"));
    }
}
