use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{PortraitError, PortraitResult};
use crate::utils::http::get_http_client;
use crate::utils::timing::log_call_timing;

const TOKEN_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Credential {
    pub access_token: String,
    pub expires_in: u64,
    pub issued_at: DateTime<Utc>,
}

impl Credential {
    pub fn issue(response: TokenResponse, issued_at: DateTime<Utc>) -> Self {
        Credential {
            access_token: response.access_token,
            expires_in: response.expires_in,
            issued_at,
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        let age = now.signed_duration_since(self.issued_at).num_seconds();
        age < i64::try_from(self.expires_in).unwrap_or(i64::MAX)
    }
}

/// One client-credentials exchange against the identity service.
pub trait CredentialExchange: Send + Sync {
    fn exchange(&self) -> impl Future<Output = PortraitResult<TokenResponse>> + Send;
}

#[derive(Serialize)]
struct TokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
}

pub fn parse_token_response(body: &str) -> PortraitResult<TokenResponse> {
    let response: TokenResponse = serde_json::from_str(body)
        .map_err(|err| PortraitError::Authentication(format!("Invalid token response: {err}")))?;
    if response.access_token.trim().is_empty() {
        return Err(PortraitError::Authentication(
            "Token response carried an empty access_token".to_string(),
        ));
    }
    Ok(response)
}

#[derive(Debug, Clone)]
pub struct TwitchCredentialExchange {
    token_url: String,
    client_id: String,
    client_secret: String,
}

impl TwitchCredentialExchange {
    pub fn new(token_url: &str, client_id: &str, client_secret: &str) -> Self {
        TwitchCredentialExchange {
            token_url: token_url.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        }
    }
}

impl CredentialExchange for TwitchCredentialExchange {
    async fn exchange(&self) -> PortraitResult<TokenResponse> {
        if self.client_id.is_empty() || self.client_secret.is_empty() {
            return Err(PortraitError::Authentication(
                "TWITCH_CLIENT_ID and TWITCH_CLIENT_SECRET must be set".to_string(),
            ));
        }

        let body = serde_urlencoded::to_string(TokenRequest {
            client_id: &self.client_id,
            client_secret: &self.client_secret,
            grant_type: "client_credentials",
        })
        .map_err(|err| PortraitError::Authentication(format!("Failed to encode token request: {err}")))?;

        info!("Requesting Twitch app access token from {}", self.token_url);
        log_call_timing("twitch", "token", None, || async {
            let response = get_http_client()
                .post(&self.token_url)
                .header("Content-Type", "application/x-www-form-urlencoded")
                .body(body)
                .timeout(Duration::from_secs(TOKEN_TIMEOUT_SECONDS))
                .send()
                .await
                .map_err(|err| PortraitError::Authentication(format!("Token request failed: {err}")))?;

            let status = response.status();
            if !status.is_success() {
                return Err(PortraitError::Authentication(format!(
                    "Token request failed with status {status}"
                )));
            }

            let text = response
                .text()
                .await
                .map_err(|err| PortraitError::Authentication(format!("Invalid token response: {err}")))?;
            parse_token_response(&text)
        })
        .await
    }
}

/// Holds the current bearer credential and refreshes it when it lapses.
///
/// The lock is held across the exchange, so concurrent callers that find
/// the cache empty wait for a single refresh instead of racing their own.
pub struct TokenCache<E> {
    exchange: E,
    current: Mutex<Option<Credential>>,
}

impl<E: CredentialExchange> TokenCache<E> {
    pub fn new(exchange: E) -> Self {
        TokenCache {
            exchange,
            current: Mutex::new(None),
        }
    }

    pub async fn get_token(&self) -> PortraitResult<Credential> {
        let mut current = self.current.lock().await;
        if let Some(credential) = current.as_ref() {
            if credential.is_valid_at(Utc::now()) {
                return Ok(credential.clone());
            }
            debug!("Cached access token expired; re-authenticating");
        }

        let response = self.exchange.exchange().await?;
        debug!("Token type: {}", response.token_type.as_deref().unwrap_or("unspecified"));
        let credential = Credential::issue(response, Utc::now());
        info!(
            "Obtained access token valid for {} seconds",
            credential.expires_in
        );
        *current = Some(credential.clone());
        Ok(credential)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use chrono::Duration as ChronoDuration;

    use super::*;

    pub(crate) struct CountingExchange {
        pub(crate) calls: Arc<AtomicUsize>,
        pub(crate) expires_in: u64,
        pub(crate) fail: bool,
    }

    impl CountingExchange {
        pub(crate) fn new(expires_in: u64) -> Self {
            CountingExchange {
                calls: Arc::new(AtomicUsize::new(0)),
                expires_in,
                fail: false,
            }
        }
    }

    impl CredentialExchange for CountingExchange {
        async fn exchange(&self) -> PortraitResult<TokenResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            tokio::task::yield_now().await;
            if self.fail {
                return Err(PortraitError::Authentication(
                    "Token request failed with status 403 Forbidden".to_string(),
                ));
            }
            Ok(TokenResponse {
                access_token: format!("token-{call}"),
                expires_in: self.expires_in,
                token_type: Some("bearer".to_string()),
            })
        }
    }

    #[tokio::test]
    async fn reuses_token_within_validity_window() {
        let exchange = CountingExchange::new(3600);
        let calls = exchange.calls.clone();
        let cache = TokenCache::new(exchange);

        let first = cache.get_token().await.unwrap();
        let second = cache.get_token().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.access_token, "token-1");
        assert_eq!(second.access_token, "token-1");
    }

    #[tokio::test]
    async fn refreshes_expired_token() {
        let exchange = CountingExchange::new(0);
        let calls = exchange.calls.clone();
        let cache = TokenCache::new(exchange);

        cache.get_token().await.unwrap();
        let second = cache.get_token().await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.access_token, "token-2");
    }

    #[tokio::test]
    async fn concurrent_first_use_exchanges_once() {
        let exchange = CountingExchange::new(3600);
        let calls = exchange.calls.clone();
        let cache = Arc::new(TokenCache::new(exchange));

        let (a, b, c) = tokio::join!(cache.get_token(), cache.get_token(), cache.get_token());
        assert_eq!(a.unwrap().access_token, "token-1");
        assert_eq!(b.unwrap().access_token, "token-1");
        assert_eq!(c.unwrap().access_token, "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_exchange_surfaces_authentication_error() {
        let mut exchange = CountingExchange::new(3600);
        exchange.fail = true;
        let cache = TokenCache::new(exchange);

        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, PortraitError::Authentication(_)));
    }

    #[test]
    fn validity_is_measured_from_issue_time() {
        let issued_at = Utc::now();
        let credential = Credential {
            access_token: "abc".to_string(),
            expires_in: 60,
            issued_at,
        };
        assert!(credential.is_valid_at(issued_at + ChronoDuration::seconds(59)));
        assert!(!credential.is_valid_at(issued_at + ChronoDuration::seconds(60)));
    }

    #[test]
    fn huge_lifetimes_do_not_wrap() {
        let issued_at = Utc::now();
        let credential = Credential {
            access_token: "abc".to_string(),
            expires_in: u64::MAX,
            issued_at,
        };
        assert!(credential.is_valid_at(issued_at + ChronoDuration::days(365)));
    }

    #[test]
    fn parses_token_payloads() {
        let parsed = parse_token_response(
            r#"{"access_token":"abc123","expires_in":5035365,"token_type":"bearer"}"#,
        )
        .unwrap();
        assert_eq!(parsed.access_token, "abc123");
        assert_eq!(parsed.expires_in, 5_035_365);

        assert!(matches!(
            parse_token_response(r#"{"message":"invalid client"}"#),
            Err(PortraitError::Authentication(_))
        ));
        assert!(matches!(
            parse_token_response(r#"{"access_token":"","expires_in":10}"#),
            Err(PortraitError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn missing_client_credentials_fail_without_network() {
        let exchange = TwitchCredentialExchange::new("http://127.0.0.1:9/token", "", "");
        assert!(matches!(
            exchange.exchange().await,
            Err(PortraitError::Authentication(_))
        ));
    }
}
