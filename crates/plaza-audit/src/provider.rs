//! Classifier provider configurations.

use crate::error::Result;
use url::Url;

/// Endpoint set for a content classification provider.
#[derive(Debug, Clone)]
pub struct Provider {
    /// Provider name (e.g., "aip-cloud").
    pub name: String,
    /// Token endpoint URL (client-credentials grant).
    pub token_url: Url,
    /// Text censoring endpoint URL.
    pub text_url: Url,
    /// Image censoring endpoint URL.
    pub image_url: Url,
}

impl Provider {
    /// Creates a new provider configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any URL is invalid.
    pub fn new(
        name: impl Into<String>,
        token_url: impl AsRef<str>,
        text_url: impl AsRef<str>,
        image_url: impl AsRef<str>,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            token_url: Url::parse(token_url.as_ref())?,
            text_url: Url::parse(text_url.as_ref())?,
            image_url: Url::parse(image_url.as_ref())?,
        })
    }

    /// Builds a provider rooted at an arbitrary base URL.
    ///
    /// Useful for self-hosted classifiers and for tests that point the
    /// client at a local stub server.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a joined path is invalid.
    pub fn with_base(name: impl Into<String>, base: impl AsRef<str>) -> Result<Self> {
        let base = Url::parse(base.as_ref())?;
        Ok(Self {
            name: name.into(),
            token_url: base.join("oauth/2.0/token")?,
            text_url: base.join("rest/2.0/solution/v1/text_censor/v2/user_defined")?,
            image_url: base.join("rest/2.0/solution/v1/img_censor/v2/user_defined")?,
        })
    }
}

impl Default for Provider {
    /// The cloud classifier used in production.
    fn default() -> Self {
        #[allow(clippy::expect_used)]
        Self::with_base("aip-cloud", "https://aip.baidubce.com/")
            .expect("default provider URLs are valid")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_provider_endpoints() {
        let provider = Provider::default();
        assert_eq!(provider.name, "aip-cloud");
        assert!(provider.token_url.as_str().ends_with("oauth/2.0/token"));
        assert!(provider.text_url.as_str().contains("text_censor"));
        assert!(provider.image_url.as_str().contains("img_censor"));
    }

    #[test]
    fn with_base_joins_paths() {
        let provider = Provider::with_base("stub", "http://localhost:9090/").unwrap();
        assert_eq!(
            provider.token_url.as_str(),
            "http://localhost:9090/oauth/2.0/token"
        );
    }

    #[test]
    fn invalid_base_is_rejected() {
        assert!(Provider::with_base("bad", "not a url").is_err());
    }
}
