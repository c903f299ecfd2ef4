//! # lente-core: Pure Settlement Logic for Lente
//!
//! Everything in here is deterministic and free of I/O: the money type, the
//! payment/register domain types, input validation, and the rules that turn
//! a stream of payments into register totals, order statuses and client debt.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Lente Settlement Stack                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              HTTP handlers (outside this workspace)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │   lente-ledger: CashRegisterService, PaymentLedger, ...         │   │
//! │  └──────────────┬──────────────────────────────────┬───────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────┐   ┌───────────────▼──────────────┐   │
//! │  │   lente-db (SQLite)         │   │   lente-gateway (boleto)     │   │
//! │  └──────────────┬──────────────┘   └───────────────┬──────────────┘   │
//! │                 │                                  │                    │
//! │  ┌──────────────▼──────────────────────────────────▼──────────────┐   │
//! │  │               ★ lente-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   money  types  validation  register  check  debt  order_status │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer centavo arithmetic
//! - [`types`] - Registers, payments, method payloads, orders, clients
//! - [`register`] - Posting payments into session totals and closing math
//! - [`check`] - Check compensation state machine
//! - [`debt`] - Client debt aggregation and debt-payment allocation
//! - [`order_status`] - Order payment-status resolution
//! - [`validation`] - Input rules for payments and sessions
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use lente_core::money::Money;
//! use lente_core::order_status::resolve;
//! use lente_core::types::OrderPaymentStatus;
//!
//! let price = Money::from_cents(10_000);
//! assert_eq!(resolve(price, Money::from_cents(4_000)), OrderPaymentStatus::PartiallyPaid);
//! assert_eq!(resolve(price, Money::from_cents(15_000)), OrderPaymentStatus::Paid);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod check;
pub mod debt;
pub mod error;
pub mod money;
pub mod order_status;
pub mod register;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of installments a bank slip or promissory note can be
/// split into.
pub const MAX_INSTALLMENTS: u32 = 48;

/// Maximum page size accepted by list operations.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Default page size when callers don't specify one.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Maximum length of free-text fields (observations, descriptions, reasons).
pub const MAX_TEXT_LEN: usize = 500;
