use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, jwk::JwkSet, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use url::Url;

use crate::error::{Error, Result};

const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";
const SIGN_UP_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signUp";
const DEFAULT_KEYS_MAX_AGE: Duration = Duration::from_secs(60 * 60);

/// Identity extracted from a verified provider assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedAccount {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Checks signature, audience, issuer and expiry of a provider ID token.
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity>;

    /// Registers an email/password account. Fails with `Error::Conflict`
    /// when the email is taken.
    async fn create_account(&self, account: NewAccount) -> Result<CreatedAccount>;
}

struct CachedKeys {
    keys: JwkSet,
    fetched_at: Instant,
    max_age: Duration,
}

impl CachedKeys {
    fn is_fresh(&self) -> bool {
        self.fetched_at.elapsed() < self.max_age
    }
}

#[derive(Debug, Deserialize)]
struct FirebaseClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    display_name: Option<&'a str>,
    return_secure_token: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorEnvelope {
    #[serde(default)]
    error: ApiErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
}

/// Firebase Authentication over its public REST surface.
pub struct FirebaseIdentityProvider {
    client: Client,
    project_id: String,
    api_key: String,
    jwks_url: String,
    sign_up_url: String,
    keys: RwLock<Option<CachedKeys>>,
}

impl FirebaseIdentityProvider {
    pub fn new(client: Client, project_id: String, api_key: String) -> Self {
        Self {
            client,
            project_id,
            api_key,
            jwks_url: JWKS_URL.to_string(),
            sign_up_url: SIGN_UP_URL.to_string(),
            keys: RwLock::new(None),
        }
    }

    /// Points the provider at alternative endpoints, e.g. the auth emulator.
    pub fn with_endpoints(mut self, jwks_url: String, sign_up_url: String) -> Self {
        self.jwks_url = jwks_url;
        self.sign_up_url = sign_up_url;
        self
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[format!("https://securetoken.google.com/{}", self.project_id)]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }

    /// A fresh key set answers every lookup, including unknown `kid`s.
    /// Only a missing or expired set triggers a download, and the write
    /// guard re-checks so concurrent misses share one fetch.
    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cached = self.keys.read().await;
            if let Some(key) = fresh_key(cached.as_ref(), kid) {
                return key;
            }
        }

        let mut cached = self.keys.write().await;
        if let Some(key) = fresh_key(cached.as_ref(), kid) {
            return key;
        }

        let fetched = self.fetch_keys().await?;
        let key = key_for(&fetched.keys, kid);
        *cached = Some(fetched);
        key
    }

    async fn fetch_keys(&self) -> Result<CachedKeys> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("Failed to fetch provider keys: {}", e)))?;
        if !response.status().is_success() {
            return Err(Error::Upstream(format!(
                "Provider key endpoint returned {}",
                response.status()
            )));
        }
        let max_age = parse_max_age(
            response
                .headers()
                .get(reqwest::header::CACHE_CONTROL)
                .and_then(|v| v.to_str().ok()),
        )
        .unwrap_or(DEFAULT_KEYS_MAX_AGE);
        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Malformed provider keys: {}", e)))?;
        tracing::info!(count = keys.keys.len(), "Refreshed identity provider signing keys");

        Ok(CachedKeys {
            keys,
            fetched_at: Instant::now(),
            max_age,
        })
    }
}

fn fresh_key(cached: Option<&CachedKeys>, kid: &str) -> Option<Result<DecodingKey>> {
    cached
        .filter(|c| c.is_fresh())
        .map(|c| key_for(&c.keys, kid))
}

fn key_for(keys: &JwkSet, kid: &str) -> Result<DecodingKey> {
    let jwk = keys
        .find(kid)
        .ok_or_else(|| Error::Unauthorized("Identity token signed by unknown key".to_string()))?;
    DecodingKey::from_jwk(jwk).map_err(|e| Error::Upstream(format!("Unusable provider key: {}", e)))
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedIdentity> {
        let header = decode_header(id_token)
            .map_err(|_| Error::Unauthorized("Malformed identity token".to_string()))?;
        if header.alg != Algorithm::RS256 {
            return Err(Error::Unauthorized(
                "Unexpected identity token algorithm".to_string(),
            ));
        }
        let kid = header
            .kid
            .ok_or_else(|| Error::Unauthorized("Identity token has no key id".to_string()))?;

        let key = self.decoding_key(&kid).await?;
        let claims = decode::<FirebaseClaims>(id_token, &key, &self.validation())
            .map_err(|e| {
                tracing::warn!("Identity token rejected: {}", e);
                Error::Unauthorized("Invalid or expired identity token".to_string())
            })?
            .claims;

        identity_from_claims(claims)
    }

    async fn create_account(&self, account: NewAccount) -> Result<CreatedAccount> {
        let url = Url::parse_with_params(&self.sign_up_url, &[("key", self.api_key.as_str())])
            .map_err(|e| Error::Config(format!("Invalid sign-up endpoint: {}", e)))?;

        let response = self
            .client
            .post(url)
            .json(&SignUpRequest {
                email: &account.email,
                password: &account.password,
                display_name: account.display_name.as_deref(),
                return_secure_token: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let envelope: ApiErrorEnvelope = response.json().await.unwrap_or_default();
            tracing::warn!(%status, code = %envelope.error.message, "Account creation rejected");
            return Err(sign_up_error(&envelope.error.message));
        }

        let created: SignUpResponse = response.json().await?;
        Ok(CreatedAccount {
            uid: created.local_id,
            email: created.email.unwrap_or(account.email),
            display_name: created.display_name.or(account.display_name),
        })
    }
}

fn identity_from_claims(claims: FirebaseClaims) -> Result<VerifiedIdentity> {
    if claims.sub.trim().is_empty() {
        return Err(Error::Unauthorized(
            "Identity token has no subject".to_string(),
        ));
    }
    let email = claims
        .email
        .filter(|e| !e.trim().is_empty())
        .ok_or_else(|| Error::Unauthorized("Identity token carries no email".to_string()))?;

    Ok(VerifiedIdentity {
        uid: claims.sub,
        email,
        name: claims.name.filter(|n| !n.trim().is_empty()),
    })
}

/// Provider error codes look like `WEAK_PASSWORD : Password should be ...`.
fn sign_up_error(message: &str) -> Error {
    let code = message.split(':').next().unwrap_or_default().trim();
    match code {
        "EMAIL_EXISTS" => Error::Conflict("This email is already in use".to_string()),
        "INVALID_EMAIL" | "MISSING_EMAIL" => Error::BadRequest("Invalid email".to_string()),
        "WEAK_PASSWORD" | "MISSING_PASSWORD" => {
            Error::BadRequest("Password does not meet the requirements".to_string())
        }
        _ => Error::Upstream(format!("Identity provider rejected sign-up: {}", message)),
    }
}

fn parse_max_age(cache_control: Option<&str>) -> Option<Duration> {
    cache_control?
        .split(',')
        .filter_map(|directive| directive.trim().strip_prefix("max-age="))
        .find_map(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves an empty key set and counts the requests it answers.
    async fn key_endpoint(cache_control: &'static str) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let body = r#"{"keys":[]}"#;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncache-control: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                    cache_control,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (format!("http://{}/keys", addr), hits)
    }

    fn provider(jwks_url: String) -> FirebaseIdentityProvider {
        let client = Client::builder().no_proxy().build().unwrap();
        FirebaseIdentityProvider::new(client, "demo-project".into(), "key".into())
            .with_endpoints(jwks_url, "http://127.0.0.1:9/signup".into())
    }

    fn token_with_kid(kid: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(format!(r#"{{"alg":"RS256","kid":"{}"}}"#, kid));
        let payload = URL_SAFE_NO_PAD.encode(r#"{"sub":"x"}"#);
        format!("{}.{}.c2ln", header, payload)
    }

    #[tokio::test]
    async fn unknown_kids_are_answered_from_a_fresh_key_set() {
        let (url, hits) = key_endpoint("public, max-age=3600").await;
        let provider = provider(url);

        for i in 0..5 {
            let err = provider
                .verify_id_token(&token_with_kid(&format!("unknown-{}", i)))
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Unauthorized(_)));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_download() {
        let (url, hits) = key_endpoint("max-age=3600").await;
        let provider = Arc::new(provider(url));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let provider = provider.clone();
                tokio::spawn(async move {
                    provider
                        .verify_id_token(&token_with_kid(&format!("kid-{}", i)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            assert!(matches!(handle.await.unwrap(), Err(Error::Unauthorized(_))));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_key_set_is_downloaded_again() {
        let (url, hits) = key_endpoint("max-age=0").await;
        let provider = provider(url);

        for _ in 0..2 {
            let err = provider.verify_id_token(&token_with_kid("gone")).await.unwrap_err();
            assert!(matches!(err, Error::Unauthorized(_)));
        }
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn max_age_is_read_from_cache_control() {
        assert_eq!(
            parse_max_age(Some("public, max-age=19302, must-revalidate, no-transform")),
            Some(Duration::from_secs(19302))
        );
        assert_eq!(parse_max_age(Some("no-cache")), None);
        assert_eq!(parse_max_age(None), None);
    }

    #[test]
    fn sign_up_codes_map_to_taxonomy() {
        assert!(matches!(sign_up_error("EMAIL_EXISTS"), Error::Conflict(_)));
        assert!(matches!(
            sign_up_error("WEAK_PASSWORD : Password should be at least 6 characters"),
            Error::BadRequest(_)
        ));
        assert!(matches!(sign_up_error("INVALID_EMAIL"), Error::BadRequest(_)));
        assert!(matches!(sign_up_error("OPERATION_NOT_ALLOWED"), Error::Upstream(_)));
    }

    #[test]
    fn claims_without_email_are_rejected() {
        let err = identity_from_claims(FirebaseClaims {
            sub: "abc".into(),
            email: None,
            name: Some("Ana".into()),
        })
        .unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));

        let identity = identity_from_claims(FirebaseClaims {
            sub: "abc".into(),
            email: Some("ana@example.com".into()),
            name: Some("  ".into()),
        })
        .unwrap();
        assert_eq!(identity.uid, "abc");
        assert_eq!(identity.name, None);
    }

    #[tokio::test]
    async fn garbage_tokens_fail_before_any_network_call() {
        let provider = FirebaseIdentityProvider::new(
            Client::new(),
            "demo-project".into(),
            "key".into(),
        )
        .with_endpoints("http://127.0.0.1:9/keys".into(), "http://127.0.0.1:9/signup".into());

        let err = provider.verify_id_token("definitely.not.jwt").await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
    }
}
