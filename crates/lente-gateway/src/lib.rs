//! # lente-gateway: Boleto Gateway Adapter
//!
//! Registers, queries and cancels boletos (Brazilian bank slips) through the
//! bank's HTTP API.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lente-ledger::BoletoService                                            │
//! │       │  issue_for_payment / reconcile / cancel                        │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  lente-gateway (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │  GatewayConfig ──► BoletoClient ──► TokenCache                  │   │
//! │  │   (config.rs)      (client.rs)      (auth.rs)                   │   │
//! │  │                        │                                        │   │
//! │  │                        ▼                                        │   │
//! │  │               wire types (types.rs)                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Bank API: POST /boletos, GET /boletos/{nn}, POST /boletos/{nn}/cancelar│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - TOML + environment configuration
//! - [`auth`] - Cached bearer token with check-then-refresh
//! - [`client`] - The HTTP client
//! - [`types`] - Request/response and wire types
//! - [`error`] - [`GatewayError`] with stable codes

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use client::BoletoClient;
pub use config::{GatewayConfig, GatewayEnvironment};
pub use error::{GatewayError, GatewayResult};
pub use types::{
    BoletoRequest, BoletoStatus, BoletoStatusReport, CancelReason, GeneratedBoleto, Payer,
};
