//! # Boleto Client
//!
//! HTTP adapter for the bank's boleto API.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  generate_boleto / get_boleto_status / cancel_boleto                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  send_authorized(build)                                                 │
//! │       │  token = authenticate()          (cached, see auth.rs)         │
//! │       │  build(http).bearer_auth(token).header("client_id", ..)        │
//! │       ▼                                                                 │
//! │  response 401? ──yes──► tokens.clear() ──► authenticate() ──► resend   │
//! │       │                                        (once)                   │
//! │       ▼                                                                 │
//! │  2xx ──► decode body     non-2xx ──► GatewayError::from_status         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,ignore
//! let client = BoletoClient::new(GatewayConfig::load(None)?)?;
//! let boleto = client.generate_boleto(&request).await?;
//! let report = client.get_boleto_status(&boleto.nosso_numero).await?;
//! ```

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::{CachedToken, TokenCache, TokenResponse};
use crate::config::GatewayConfig;
use crate::error::{GatewayError, GatewayResult, AUTH_FAILED};
use crate::types::{
    BoletoRequest, BoletoStatusReport, CancelReason, GeneratedBoleto, WireBoleto,
    WireBoletoRequest, WireBoletoStatus, WireCancelRequest,
};

/// Boleto gateway client. Cheap to share behind an `Arc`; the token cache
/// is internal.
#[derive(Debug)]
pub struct BoletoClient {
    http: reqwest::Client,
    config: GatewayConfig,
    tokens: TokenCache,
}

impl BoletoClient {
    /// Validates `config` and builds the HTTP client with its timeout.
    pub fn new(config: GatewayConfig) -> GatewayResult<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GatewayError::invalid_config(format!("Failed to build HTTP client: {e}")))?;

        info!(
            environment = %config.environment,
            base_url = %config.base_url,
            "Boleto client ready"
        );

        Ok(BoletoClient {
            http,
            config,
            tokens: TokenCache::new(),
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Returns a valid bearer token, exchanging credentials if needed.
    pub async fn authenticate(&self) -> GatewayResult<String> {
        self.tokens.get_or_refresh(|| self.fetch_token()).await
    }

    async fn fetch_token(&self) -> GatewayResult<CachedToken> {
        if let Some(token) = &self.config.access_token {
            debug!("Using configured static access token");
            return Ok(CachedToken::new(token.clone(), self.config.static_token_lifetime()));
        }

        let auth_url = self
            .config
            .auth_url
            .as_deref()
            .ok_or_else(|| GatewayError::invalid_config("auth_url is not configured"))?;
        let secret = self.config.client_secret.as_deref().unwrap_or_default();

        let mut form = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", secret),
        ];
        if let Some(scope) = &self.config.scope {
            form.push(("scope", scope.as_str()));
        }

        debug!(client_id = %self.config.client_id, "Exchanging client credentials");

        let response = self.http.post(auth_url).form(&form).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let mut err = GatewayError::from_status(status.as_u16(), &body);
            err.code = AUTH_FAILED;
            warn!(status = status.as_u16(), "Gateway token exchange refused");
            return Err(err);
        }

        let token: TokenResponse = decode(response).await?;
        Ok(token.into())
    }

    /// Sends a request with the bearer token; on `401` clears the cache and
    /// retries exactly once with a fresh token.
    async fn send_authorized<F>(&self, build: F) -> GatewayResult<Response>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let token = self.authenticate().await?;
        let response = self.authorized(build(&self.http), &token).send().await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return check_status(response).await;
        }

        warn!("Gateway answered 401, re-authenticating");
        self.tokens.clear().await;

        let token = self.authenticate().await?;
        let response = self.authorized(build(&self.http), &token).send().await?;
        check_status(response).await
    }

    fn authorized(&self, request: RequestBuilder, token: &str) -> RequestBuilder {
        request
            .bearer_auth(token)
            .header("client_id", &self.config.client_id)
    }

    // =========================================================================
    // Boleto Operations
    // =========================================================================

    /// Registers a boleto. Cooperative, post and beneficiary codes are taken
    /// from configuration.
    pub async fn generate_boleto(&self, request: &BoletoRequest) -> GatewayResult<GeneratedBoleto> {
        request.validate()?;

        let body = WireBoletoRequest::build(&self.config, request);
        let url = self.config.endpoint("boletos");

        info!(
            your_number = %request.your_number,
            amount = request.amount.cents(),
            due_date = %request.due_date,
            "Registering boleto"
        );

        let response = self.send_authorized(|http| http.post(&url).json(&body)).await?;
        let wire: WireBoleto = decode(response).await?;

        info!(nosso_numero = %wire.nosso_numero, "Boleto registered");
        Ok(wire.into())
    }

    pub async fn get_boleto_status(&self, nosso_numero: &str) -> GatewayResult<BoletoStatusReport> {
        validate_nosso_numero(nosso_numero)?;

        let url = self.config.endpoint(&format!("boletos/{nosso_numero}"));
        let response = self.send_authorized(|http| http.get(&url)).await?;
        let wire: WireBoletoStatus = decode(response).await?;
        let report = BoletoStatusReport::try_from(wire)?;

        debug!(nosso_numero = %nosso_numero, status = %report.status, "Boleto status");
        Ok(report)
    }

    pub async fn cancel_boleto(&self, nosso_numero: &str, reason: CancelReason) -> GatewayResult<()> {
        validate_nosso_numero(nosso_numero)?;

        let url = self.config.endpoint(&format!("boletos/{nosso_numero}/cancelar"));
        let body = WireCancelRequest { motivo: reason };
        self.send_authorized(|http| http.post(&url).json(&body)).await?;

        info!(nosso_numero = %nosso_numero, ?reason, "Boleto cancelled");
        Ok(())
    }

    /// True when credentials are accepted. Failures are logged by code only.
    pub async fn test_connection(&self) -> bool {
        match self.authenticate().await {
            Ok(_) => true,
            Err(e) => {
                warn!(code = e.code, "Gateway connection test failed");
                false
            }
        }
    }
}

fn validate_nosso_numero(nosso_numero: &str) -> GatewayResult<()> {
    if nosso_numero.is_empty() || !nosso_numero.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(GatewayError::invalid_request(format!(
            "Invalid nosso número: '{nosso_numero}'"
        )));
    }
    Ok(())
}

async fn check_status(response: Response) -> GatewayResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::from_status(status.as_u16(), &body))
}

async fn decode<T: DeserializeOwned>(response: Response) -> GatewayResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| GatewayError::decode(format!("Unexpected gateway response: {e}")))
}
