//! # lente-db: Database Layer for Lente Settlement
//!
//! SQLite storage for cash register sessions, the payment ledger and the
//! order/client read model, accessed asynchronously through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lente Data Flow                                  │
//! │                                                                         │
//! │  lente-ledger (CashRegisterService, PaymentLedger, DebtService)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     lente-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │  │   │
//! │  │   │               │    │ RegisterRepo   │    │ 001_initial  │  │   │
//! │  │   │ SqlitePool    │◄───│ PaymentRepo    │    │ _schema.sql  │  │   │
//! │  │   │ Transactions  │    │ OrderRepo      │    │              │  │   │
//! │  │   │               │    │ ClientRepo     │    │              │  │   │
//! │  │   └───────────────┘    └────────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lente_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("lente.db")).await?;
//!
//! let mut conn = db.acquire().await?;
//! let open = db.registers().find_open(&mut conn).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::order::OrderRepository;
pub use repository::payment::{compensation_filter, MethodBreakdown, PaymentRepository};
pub use repository::register::{CloseRegister, RegisterRepository};
