//! # lente-ledger: Settlement Services
//!
//! The operations the HTTP handlers call. Each service owns a [`Database`]
//! handle and runs every write in a single transaction.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          lente-ledger                                   │
//! │                                                                         │
//! │  ┌─────────────────────┐   ┌─────────────────────┐                      │
//! │  │ CashRegisterService │◄──│    PaymentLedger    │──► DebtService       │
//! │  │ (register.rs)       │   │    (payments.rs)    │    (debt.rs)         │
//! │  └─────────────────────┘   └──────────▲──────────┘                      │
//! │                                       │ confirm / cancel                │
//! │                            ┌──────────┴──────────┐                      │
//! │                            │    BoletoService    │──► dyn BoletoGateway │
//! │                            │    (boleto.rs)      │                      │
//! │                            └─────────────────────┘                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("lente.db")).await?;
//! let ledger = Ledger::new(db, LedgerSettings::default());
//!
//! ledger.registers.open(Money::from_cents(10_000), None, "ana").await?;
//! let payment = ledger.payments.create(input).await?;
//! ```

pub mod boleto;
pub mod debt;
pub mod error;
pub mod payments;
pub mod register;
pub mod settings;

use std::sync::Arc;

use lente_db::Database;

pub use boleto::{BoletoGateway, BoletoService, Reconciliation};
pub use debt::{ClientDebtUpdate, DebtService};
pub use error::{ErrorBody, ErrorCode, ServiceError, ServiceResult};
pub use payments::{DailyPayments, PaymentLedger};
pub use register::{CashRegisterService, MethodSummary, RegisterSummary};
pub use settings::LedgerSettings;

/// All services over one database.
#[derive(Debug, Clone)]
pub struct Ledger {
    pub registers: CashRegisterService,
    pub payments: PaymentLedger,
    pub debts: DebtService,
    db: Database,
    settings: LedgerSettings,
}

impl Ledger {
    pub fn new(db: Database, settings: LedgerSettings) -> Self {
        Ledger {
            registers: CashRegisterService::new(db.clone(), settings.clone()),
            payments: PaymentLedger::new(db.clone(), settings.clone()),
            debts: DebtService::new(db.clone()),
            db,
            settings,
        }
    }

    /// Boleto operations against `gateway`.
    pub fn boletos(&self, gateway: Arc<dyn BoletoGateway>) -> BoletoService {
        BoletoService::new(
            self.db.clone(),
            self.payments.clone(),
            gateway,
            self.settings.clone(),
        )
    }
}
