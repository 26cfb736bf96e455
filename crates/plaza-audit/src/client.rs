//! High-level moderation client.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::debug;

use crate::error::{Error, Result};
use crate::provider::Provider;
use crate::token::{AccessToken, TokenResponse};

/// Reason reported when the classifier rejects content without details.
const DEFAULT_REJECT_REASON: &str = "content flagged by classifier";

/// Outcome of screening a piece of content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Whether the content may be published.
    pub passed: bool,
    /// Reasons for rejection; empty when `passed` is true.
    pub reasons: Vec<String>,
}

impl Verdict {
    /// A passing verdict.
    #[must_use]
    pub const fn pass() -> Self {
        Self {
            passed: true,
            reasons: Vec::new(),
        }
    }

    /// A rejecting verdict with the given reasons.
    #[must_use]
    pub fn rejected(reasons: Vec<String>) -> Self {
        let reasons = if reasons.is_empty() {
            vec![DEFAULT_REJECT_REASON.to_string()]
        } else {
            reasons
        };
        Self {
            passed: false,
            reasons,
        }
    }

    /// Merges many verdicts into one: passes only if every part passed.
    #[must_use]
    pub fn merge(verdicts: impl IntoIterator<Item = Self>) -> Self {
        let mut reasons = Vec::new();
        for verdict in verdicts {
            if !verdict.passed {
                reasons.extend(verdict.reasons);
            }
        }
        if reasons.is_empty() {
            Self::pass()
        } else {
            Self {
                passed: false,
                reasons,
            }
        }
    }
}

/// Client for the content classification service.
///
/// Cheap to clone; all clones share the HTTP connection pool and the
/// cached access token.
#[derive(Debug, Clone)]
pub struct AuditClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    api_key: String,
    secret_key: String,
    provider: Provider,
    http_client: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
}

impl AuditClient {
    /// Creates a new client with the given credentials.
    #[must_use]
    pub fn new(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        provider: Provider,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                api_key: api_key.into(),
                secret_key: secret_key.into(),
                provider,
                http_client: reqwest::Client::new(),
                token: Mutex::new(None),
            }),
        }
    }

    /// The provider this client talks to.
    #[must_use]
    pub fn provider(&self) -> &Provider {
        &self.inner.provider
    }

    /// Returns a valid access token, fetching a fresh one if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the token request fails or the credentials
    /// are rejected.
    async fn access_token(&self) -> Result<String> {
        let mut guard = self.inner.token.lock().await;

        if let Some(token) = guard.as_ref()
            && token.is_valid()
        {
            return Ok(token.access_token.clone());
        }

        debug!(provider = %self.inner.provider.name, "fetching classifier access token");

        let response = self
            .inner
            .http_client
            .post(self.inner.provider.token_url.clone())
            .query(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.inner.api_key.as_str()),
                ("client_secret", self.inner.secret_key.as_str()),
            ])
            .send()
            .await?;

        let body: TokenResponse = response.json().await?;
        if body.error.is_some() {
            return Err(body.into_error());
        }

        let token = AccessToken::from_response(body)?;
        let raw = token.access_token.clone();
        *guard = Some(token);
        Ok(raw)
    }

    /// Screens free-form text against the provider's policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the classifier reports
    /// an API error. A rejection is NOT an error; inspect the verdict.
    pub async fn censor_text(&self, text: &str) -> Result<Verdict> {
        let token = self.access_token().await?;

        let response = self
            .inner
            .http_client
            .post(self.inner.provider.text_url.clone())
            .query(&[("access_token", token.as_str())])
            .form(&[("text", text)])
            .send()
            .await?;

        let body: CensorResponse = response.json().await?;
        body.into_verdict()
    }

    /// Screens a single image by its publicly reachable URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the classifier reports
    /// an API error.
    pub async fn censor_image(&self, image_url: &str) -> Result<Verdict> {
        let token = self.access_token().await?;

        let response = self
            .inner
            .http_client
            .post(self.inner.provider.image_url.clone())
            .query(&[("access_token", token.as_str())])
            .form(&[("imgUrl", image_url)])
            .send()
            .await?;

        let body: CensorResponse = response.json().await?;
        body.into_verdict()
    }

    /// Screens several images concurrently and merges the verdicts.
    ///
    /// The merged verdict passes only if every image passed; rejection
    /// reasons keep the order of the input URLs.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered across the batch.
    pub async fn censor_images(&self, image_urls: &[String]) -> Result<Verdict> {
        if image_urls.is_empty() {
            return Ok(Verdict::pass());
        }

        let mut set = JoinSet::new();
        for (index, url) in image_urls.iter().cloned().enumerate() {
            let client = self.clone();
            set.spawn(async move { (index, client.censor_image(&url).await) });
        }

        let mut verdicts: Vec<(usize, Verdict)> = Vec::with_capacity(image_urls.len());
        while let Some(joined) = set.join_next().await {
            let (index, verdict) = joined?;
            verdicts.push((index, verdict?));
        }
        verdicts.sort_by_key(|(index, _)| *index);

        Ok(Verdict::merge(verdicts.into_iter().map(|(_, v)| v)))
    }
}

/// Raw censoring endpoint response.
#[derive(Debug, Deserialize)]
struct CensorResponse {
    #[serde(rename = "conclusionType")]
    conclusion_type: Option<u8>,
    data: Option<Vec<CensorHit>>,
    error_code: Option<i64>,
    error_msg: Option<String>,
}

/// One policy hit inside a censoring response.
#[derive(Debug, Deserialize)]
struct CensorHit {
    msg: Option<String>,
}

impl CensorResponse {
    /// Conclusion type the provider uses for compliant content.
    const PASS: u8 = 1;

    fn into_verdict(self) -> Result<Verdict> {
        if let Some(code) = self.error_code {
            let message = self
                .error_msg
                .unwrap_or_else(|| "unspecified classifier failure".to_string());
            return Err(Error::api(code, message));
        }

        match self.conclusion_type {
            Some(Self::PASS) => Ok(Verdict::pass()),
            Some(_) => {
                let reasons = self
                    .data
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|hit| hit.msg)
                    .collect();
                Ok(Verdict::rejected(reasons))
            }
            None => Err(Error::InvalidResponse(
                "response carried neither a conclusion nor an error code".to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(json: &str) -> CensorResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn compliant_response_passes() {
        let verdict = parse(r#"{"conclusionType":1,"conclusion":"ok"}"#)
            .into_verdict()
            .unwrap();
        assert!(verdict.passed);
        assert!(verdict.reasons.is_empty());
    }

    #[test]
    fn rejection_collects_hit_messages() {
        let verdict = parse(
            r#"{"conclusionType":2,"data":[{"msg":"prohibited goods"},{"msg":"contact info"}]}"#,
        )
        .into_verdict()
        .unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.reasons, vec!["prohibited goods", "contact info"]);
    }

    #[test]
    fn rejection_without_details_uses_fallback_reason() {
        let verdict = parse(r#"{"conclusionType":3}"#).into_verdict().unwrap();
        assert!(!verdict.passed);
        assert_eq!(verdict.reasons, vec![DEFAULT_REJECT_REASON]);
    }

    #[test]
    fn api_error_is_surfaced() {
        let err = parse(r#"{"error_code":17,"error_msg":"daily quota exceeded"}"#)
            .into_verdict()
            .unwrap_err();
        assert!(matches!(err, Error::Api { code: 17, .. }));
    }

    #[test]
    fn shapeless_response_is_invalid() {
        let err = parse(r"{}").into_verdict().unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn merge_passes_only_when_all_pass() {
        let merged = Verdict::merge([Verdict::pass(), Verdict::pass()]);
        assert!(merged.passed);

        let merged = Verdict::merge([
            Verdict::pass(),
            Verdict::rejected(vec!["blurry watermark scam".to_string()]),
        ]);
        assert!(!merged.passed);
        assert_eq!(merged.reasons, vec!["blurry watermark scam"]);
    }

    #[test]
    fn rejected_with_no_reasons_gets_fallback() {
        let verdict = Verdict::rejected(Vec::new());
        assert_eq!(verdict.reasons, vec![DEFAULT_REJECT_REASON]);
    }
}
