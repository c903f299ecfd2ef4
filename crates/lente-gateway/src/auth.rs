//! # Gateway Token Cache
//!
//! Holds the bearer token used on every gateway call as an explicit
//! `{token, expires_at}` value.
//!
//! ## Refresh Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Check-then-refresh                                 │
//! │                                                                         │
//! │  get_or_refresh(fetch)                                                 │
//! │       │                                                                 │
//! │       ├── read lock: token valid beyond margin? ──► return it          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  write lock                                                             │
//! │       ├── re-check (another task may have refreshed) ──► return it     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  fetch().await  ──► store {token, expires_at} ──► return it            │
//! │                                                                         │
//! │  [401 from the gateway]  ──► clear()  ──► next call fetches again      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Two tasks that both observe an expired token after `clear()` may both end
//! up exchanging credentials; the exchange is idempotent so the extra call is
//! harmless.

use std::future::Future;
use std::time::{Duration, Instant};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::GatewayResult;

/// Largest margin before expiry at which a token is refreshed (5 minutes).
pub const REFRESH_MARGIN_SECS: u64 = 300;

/// Refresh margin for a token of the given lifetime: a tenth of the
/// lifetime, capped at [`REFRESH_MARGIN_SECS`].
pub fn refresh_margin(lifetime: Duration) -> Duration {
    (lifetime / 10).min(Duration::from_secs(REFRESH_MARGIN_SECS))
}

/// Token information stored after authentication
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    /// When the access token expires (local time)
    pub expires_at: Instant,
    /// From here on the token is replaced before use
    pub refresh_at: Instant,
}

impl CachedToken {
    pub fn new(access_token: impl Into<String>, lifetime: Duration) -> Self {
        let now = Instant::now();
        CachedToken {
            access_token: access_token.into(),
            expires_at: now + lifetime,
            refresh_at: now + lifetime - refresh_margin(lifetime),
        }
    }

    /// Check if the token is expired or about to expire
    pub fn needs_refresh(&self) -> bool {
        Instant::now() >= self.refresh_at
    }

    /// Check if the token is completely expired (no grace period)
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Get remaining valid time
    pub fn remaining_secs(&self) -> u64 {
        self.expires_at
            .checked_duration_since(Instant::now())
            .map_or(0, |d| d.as_secs())
    }
}

/// OAuth client-credentials response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Lifetime in seconds.
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl From<TokenResponse> for CachedToken {
    fn from(resp: TokenResponse) -> Self {
        CachedToken::new(resp.access_token, Duration::from_secs(resp.expires_in))
    }
}

/// Shared token slot.
#[derive(Debug, Default)]
pub struct TokenCache {
    token: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a valid token, calling `fetch` only when the cached one is
    /// missing or inside the refresh margin.
    pub async fn get_or_refresh<F, Fut>(&self, fetch: F) -> GatewayResult<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = GatewayResult<CachedToken>>,
    {
        {
            let guard = self.token.read().await;
            if let Some(token) = guard.as_ref() {
                if !token.needs_refresh() {
                    debug!(remaining_secs = token.remaining_secs(), "Using cached gateway token");
                    return Ok(token.access_token.clone());
                }
            }
        }

        let mut guard = self.token.write().await;

        // Double-check after acquiring write lock
        if let Some(token) = guard.as_ref() {
            if !token.needs_refresh() {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = fetch().await?;
        info!(expires_in_secs = fresh.remaining_secs(), "Gateway token refreshed");
        let access_token = fresh.access_token.clone();
        *guard = Some(fresh);

        Ok(access_token)
    }

    /// Drops the cached token so the next call re-authenticates.
    pub async fn clear(&self) {
        *self.token.write().await = None;
    }

    /// Current token info (without triggering refresh)
    pub async fn current(&self) -> Option<CachedToken> {
        self.token.read().await.clone()
    }
}
