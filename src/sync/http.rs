//! HTTP client for the sync server.
//!
//! Routes:
//!   GET  /ping             liveness
//!   GET  /api/v1/sync      digest listing (200 JSON, 204 when empty)
//!   PUT  /api/v1/          upload a secret
//!   POST /api/v1/          download a secret by id (204 when missing)
//!   POST /api/v1/register  create an account
//!   POST /api/v1/login     authenticate
//!
//! Every request carries the current bearer token. The server may rotate
//! it by returning a new `Authorization` header on any response; the
//! `TokenHolder` swaps it in once the call has completed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Serialize;
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::remote::Remote;
use crate::errors::{KeepSyncError, Result};
use crate::vault::{Digest, Secret, SecretId};

/// Default per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared holder for the session's `Authorization` header value.
///
/// Clones share the same slot, so a token rotated by one call is seen by
/// every later call.
#[derive(Clone, Default)]
pub struct TokenHolder {
    inner: Arc<RwLock<Option<String>>>,
}

impl TokenHolder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let holder = Self::new();
        holder.set(token);
        holder
    }

    pub fn get(&self) -> Option<String> {
        self.inner.read().clone()
    }

    pub fn set(&self, token: impl Into<String>) {
        *self.inner.write() = Some(token.into());
    }

    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Adopt a token carried in response `headers`. Returns whether one
    /// was found.
    pub fn absorb(&self, headers: &HeaderMap) -> bool {
        match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            Some(token) if !token.is_empty() => {
                self.set(token);
                true
            }
            _ => false,
        }
    }
}

/// Account name and password sent to `register` and `login`.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
    tokens: TokenHolder,
}

impl HttpRemote {
    pub fn new(base_url: &str, tokens: TokenHolder) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("keepsync/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| KeepSyncError::Transport(format!("build client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens,
        })
    }

    pub fn tokens(&self) -> &TokenHolder {
        &self.tokens
    }

    /// Create an account. The server may return a session token.
    pub async fn register(&self, credentials: &Credentials) -> Result<()> {
        let resp = self
            .send(self.client.post(self.url("/api/v1/register")).json(credentials))
            .await?;
        if !resp.status().is_success() {
            return Err(status_error("register", resp).await);
        }
        Ok(())
    }

    /// Authenticate and store the returned session token.
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        let resp = self
            .send(self.client.post(self.url("/api/v1/login")).json(credentials))
            .await?;
        if resp.status() != StatusCode::OK {
            return Err(status_error("login", resp).await);
        }
        if self.tokens.get().is_none() {
            return Err(KeepSyncError::Transport(
                "login succeeded but no session token was returned".into(),
            ));
        }
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the token, send, and adopt any rotated token.
    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match self.tokens.get() {
            Some(token) => request.header(AUTHORIZATION, token),
            None => request,
        };

        let resp = request
            .send()
            .await
            .map_err(|e| KeepSyncError::Transport(e.to_string()))?;

        if self.tokens.absorb(resp.headers()) {
            debug!("session token rotated");
        }
        Ok(resp)
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn ping(&self) -> Result<()> {
        let resp = self
            .client
            .get(self.url("/ping"))
            .send()
            .await
            .map_err(|e| KeepSyncError::Liveness(e.to_string()))?;
        if resp.status() != StatusCode::OK {
            return Err(KeepSyncError::Liveness(format!(
                "ping returned {}",
                resp.status()
            )));
        }
        Ok(())
    }

    async fn digests(&self, owner_id: &str) -> Result<Vec<Digest>> {
        debug!(owner = owner_id, "fetching remote digests");
        let resp = self.send(self.client.get(self.url("/api/v1/sync"))).await?;
        match resp.status() {
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            StatusCode::OK => decode_json(resp).await,
            _ => Err(status_error("sync", resp).await),
        }
    }

    async fn push(&self, secret: &Secret) -> Result<()> {
        let resp = self
            .send(self.client.put(self.url("/api/v1/")).json(secret))
            .await?;
        if !resp.status().is_success() {
            return Err(status_error("push", resp).await);
        }
        Ok(())
    }

    async fn pull(&self, id: SecretId) -> Result<Secret> {
        let resp = self
            .send(self.client.post(self.url("/api/v1/")).json(&id))
            .await?;
        match resp.status() {
            StatusCode::NO_CONTENT => Err(KeepSyncError::NotFound(id)),
            StatusCode::OK => decode_json(resp).await,
            _ => Err(status_error("pull", resp).await),
        }
    }
}

async fn decode_json<T: serde::de::DeserializeOwned>(resp: Response) -> Result<T> {
    let body = resp
        .bytes()
        .await
        .map_err(|e| KeepSyncError::Transport(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| KeepSyncError::Decode(e.to_string()))
}

async fn status_error(op: &str, resp: Response) -> KeepSyncError {
    let status = resp.status();
    let body = resp.text().await.unwrap_or_else(|_| "unknown".to_string());
    KeepSyncError::Transport(format!("{op} failed with {status}: {}", body.trim()))
}
