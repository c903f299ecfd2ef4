//! # Cash Register Service
//!
//! Opens and closes the single live session and keeps its totals in step
//! with settled payments.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   open(balance) ──► [open] ──record_*──► [open, version+1] ──► ...     │
//! │        │                                         │                      │
//! │        │ another session open                    │ close(counted)      │
//! │        ▼                                         ▼                      │
//! │   ALREADY_OPEN                      [closed: expected, variance]       │
//! │                                                  │                      │
//! │                                                  │ soft_delete          │
//! │                                                  ▼                      │
//! │                                             [hidden]                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Totals Update (compare-and-set)
//! ```text
//!   loop up to cas_max_retries:
//!     session = find_open()                  ── none ──► NO_OPEN_REGISTER
//!     totals  = RegisterTotals::of(session).apply(posting)
//!     UPDATE ... WHERE id = ? AND version = ? AND status = 'open'
//!       1 row  ──► done
//!       0 rows ──► someone else moved the version, go again
//!   exhausted ──► CONFLICT
//! ```
//!
//! The `record_*` mutators take the caller's connection so the totals move
//! inside the same transaction as the payment row.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};

use lente_core::register::{closing_figures, expected_balance, Posting, RegisterTotals};
use lente_core::validation::{validate_balance, validate_optional_text, validate_required};
use lente_core::{
    CashRegisterSession, Money, Page, Paginated, PaymentMethod, PaymentType, RegisterFilter,
};
use lente_db::{CloseRegister, Database};

use crate::error::{ServiceError, ServiceResult};
use crate::settings::LedgerSettings;

/// Settled amount for one method/type pair within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodSummary {
    pub payment_type: PaymentType,
    pub method: PaymentMethod,
    pub count: i64,
    pub amount: Money,
}

/// Everything the register export needs about a session.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterSummary {
    pub session: CashRegisterSession,
    /// Stored figure for closed sessions, computed live for the open one.
    pub expected_balance: Money,
    pub net_movement: Money,
    pub payment_count: i64,
    pub cancelled_count: i64,
    pub breakdown: Vec<MethodSummary>,
}

#[derive(Debug, Clone)]
pub struct CashRegisterService {
    db: Database,
    settings: LedgerSettings,
}

impl CashRegisterService {
    pub fn new(db: Database, settings: LedgerSettings) -> Self {
        CashRegisterService { db, settings }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens a new session.
    ///
    /// ## Errors
    /// * `AlreadyOpen` - a live session is open (also when losing the race
    ///   on the single-open index)
    /// * `Validation` - negative balance, blank `opened_by`, long observations
    pub async fn open(
        &self,
        opening_balance: Money,
        observations: Option<String>,
        opened_by: &str,
    ) -> ServiceResult<CashRegisterSession> {
        validate_balance("opening_balance", opening_balance)?;
        validate_required("opened_by", opened_by)?;
        validate_optional_text("observations", observations.as_deref())?;

        let registers = self.db.registers();
        let mut tx = self.db.begin().await?;

        if let Some(open) = registers.find_open(&mut tx).await? {
            return Err(ServiceError::AlreadyOpen {
                register_id: open.id,
            });
        }

        let session = CashRegisterSession::open(opening_balance, opened_by, observations, Utc::now());

        if let Err(e) = registers.insert(&mut tx, &session).await {
            if !e.is_unique_violation_on("cash_registers.status") {
                return Err(e.into());
            }
            drop(tx);

            warn!(opened_by = %opened_by, "Lost race opening cash register");
            let mut conn = self.db.acquire().await?;
            let register_id = registers
                .find_open(&mut conn)
                .await?
                .map(|s| s.id)
                .unwrap_or_default();
            return Err(ServiceError::AlreadyOpen { register_id });
        }

        tx.commit().await?;

        info!(
            register_id = %session.id,
            opening_balance = %session.opening_balance,
            opened_by = %opened_by,
            "Cash register opened"
        );

        Ok(session)
    }

    /// Closes the open session against the physically counted balance.
    ///
    /// The variance is recorded, never rejected.
    pub async fn close(
        &self,
        closing_balance: Money,
        observations: Option<String>,
        closed_by: &str,
    ) -> ServiceResult<CashRegisterSession> {
        validate_balance("closing_balance", closing_balance)?;
        validate_required("closed_by", closed_by)?;
        validate_optional_text("observations", observations.as_deref())?;

        let registers = self.db.registers();
        let mut last_id = String::new();

        for attempt in 1..=self.settings.cas_max_retries {
            let mut tx = self.db.begin().await?;

            let session = registers
                .find_open(&mut tx)
                .await?
                .ok_or(ServiceError::NoOpenRegister)?;
            let figures = closing_figures(&session, closing_balance);

            let close = CloseRegister {
                closing_balance,
                figures,
                closed_by,
                observations: observations.as_deref(),
                closed_at: Utc::now(),
            };

            if registers.close(&mut tx, &session.id, session.version, &close).await? {
                let closed = registers
                    .get_by_id(&mut tx, &session.id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("cash register", &session.id))?;
                tx.commit().await?;

                info!(
                    register_id = %closed.id,
                    expected = %figures.expected_balance,
                    closing = %closing_balance,
                    variance = %figures.variance,
                    closed_by = %closed_by,
                    "Cash register closed"
                );
                return Ok(closed);
            }

            warn!(register_id = %session.id, attempt, "Register changed while closing, retrying");
            last_id = session.id;
        }

        Err(ServiceError::Conflict {
            entity: "cash register",
            id: last_id,
        })
    }

    /// Hides a closed session.
    pub async fn soft_delete(&self, id: &str, deleted_by: &str) -> ServiceResult<()> {
        validate_required("deleted_by", deleted_by)?;

        let registers = self.db.registers();
        let mut tx = self.db.begin().await?;

        let session = registers
            .get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("cash register", id))?;

        if session.is_open() {
            return Err(ServiceError::CannotDeleteOpenRegister {
                register_id: session.id,
            });
        }

        if !registers.soft_delete(&mut tx, id, deleted_by, Utc::now()).await? {
            return Err(ServiceError::not_found("cash register", id));
        }
        tx.commit().await?;

        info!(register_id = %id, deleted_by = %deleted_by, "Cash register deleted");
        Ok(())
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_current(&self) -> ServiceResult<CashRegisterSession> {
        let mut conn = self.db.acquire().await?;
        self.db
            .registers()
            .find_open(&mut conn)
            .await?
            .ok_or_else(|| ServiceError::not_found("cash register", "current"))
    }

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<CashRegisterSession> {
        let mut conn = self.db.acquire().await?;
        self.db
            .registers()
            .get_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("cash register", id))
    }

    pub async fn list(
        &self,
        filter: &RegisterFilter,
        page: Page,
    ) -> ServiceResult<Paginated<CashRegisterSession>> {
        let mut conn = self.db.acquire().await?;
        Ok(self.db.registers().list(&mut conn, filter, page).await?)
    }

    /// Totals, counts and per-method breakdown of one session.
    pub async fn summary(&self, id: &str) -> ServiceResult<RegisterSummary> {
        let mut conn = self.db.acquire().await?;
        let session = self
            .db
            .registers()
            .get_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("cash register", id))?;

        let payments = self.db.payments();
        let breakdown: Vec<MethodSummary> = payments
            .settled_breakdown(&mut conn, id)
            .await?
            .into_iter()
            .map(|row| MethodSummary {
                payment_type: row.payment_type,
                method: row.payment_method,
                count: row.count,
                amount: Money::from_cents(row.amount_cents),
            })
            .collect();
        let cancelled_count = payments.count_cancelled(&mut conn, id).await?;

        let payment_count = breakdown.iter().map(|m| m.count).sum();
        let net_movement = RegisterTotals::of(&session).net_movement();
        let expected = session
            .expected_balance
            .unwrap_or_else(|| expected_balance(&session));

        Ok(RegisterSummary {
            session,
            expected_balance: expected,
            net_movement,
            payment_count,
            cancelled_count,
            breakdown,
        })
    }

    // =========================================================================
    // Totals Mutators
    // =========================================================================

    /// Adds a sale to the open session. Returns the session id.
    pub async fn record_sale(
        &self,
        conn: &mut SqliteConnection,
        method: PaymentMethod,
        amount: Money,
    ) -> ServiceResult<String> {
        self.apply_current(conn, Posting::Sale { method, amount }).await
    }

    /// Adds a received debt payment to the open session.
    pub async fn record_debt_payment(
        &self,
        conn: &mut SqliteConnection,
        amount: Money,
    ) -> ServiceResult<String> {
        self.apply_current(conn, Posting::DebtPayment { amount }).await
    }

    /// Adds an expense to the open session.
    pub async fn record_expense(
        &self,
        conn: &mut SqliteConnection,
        amount: Money,
    ) -> ServiceResult<String> {
        self.apply_current(conn, Posting::Expense { amount }).await
    }

    pub(crate) async fn apply_current(
        &self,
        conn: &mut SqliteConnection,
        posting: Posting,
    ) -> ServiceResult<String> {
        let registers = self.db.registers();
        let mut last_id = String::new();

        for attempt in 1..=self.settings.cas_max_retries {
            let session = registers
                .find_open(conn)
                .await?
                .ok_or(ServiceError::NoOpenRegister)?;

            let mut totals = RegisterTotals::of(&session);
            totals.apply(posting);

            if registers
                .update_totals(conn, &session.id, session.version, &totals)
                .await?
            {
                debug!(register_id = %session.id, ?posting, "Posting applied");
                return Ok(session.id);
            }

            warn!(register_id = %session.id, attempt, "Register totals changed concurrently, retrying");
            last_id = session.id;
        }

        Err(ServiceError::Conflict {
            entity: "cash register",
            id: last_id,
        })
    }

    /// Applies the inverse of `posting` to the session that settled it.
    ///
    /// Returns `false` without touching anything when that session is
    /// closed or gone; closed totals are frozen.
    pub(crate) async fn reverse(
        &self,
        conn: &mut SqliteConnection,
        register_id: &str,
        posting: Posting,
    ) -> ServiceResult<bool> {
        let registers = self.db.registers();

        for attempt in 1..=self.settings.cas_max_retries {
            let Some(session) = registers.get_by_id(conn, register_id).await? else {
                warn!(register_id = %register_id, "Settling register is gone, reversal skipped");
                return Ok(false);
            };
            if !session.is_open() {
                warn!(
                    register_id = %register_id,
                    amount = %posting.amount(),
                    "Settling register is closed, reversal skipped"
                );
                return Ok(false);
            }

            let mut totals = RegisterTotals::of(&session);
            totals.reverse(posting);

            if registers
                .update_totals(conn, &session.id, session.version, &totals)
                .await?
            {
                debug!(register_id = %register_id, ?posting, "Posting reversed");
                return Ok(true);
            }

            warn!(register_id = %register_id, attempt, "Register totals changed concurrently, retrying");
        }

        Err(ServiceError::Conflict {
            entity: "cash register",
            id: register_id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lente_core::RegisterStatus;
    use lente_db::DbConfig;

    async fn service() -> CashRegisterService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        CashRegisterService::new(db, LedgerSettings::default())
    }

    fn reais(r: i64) -> Money {
        Money::from_cents(r * 100)
    }

    #[tokio::test]
    async fn test_open_twice_is_rejected() {
        let svc = service().await;
        let first = svc.open(reais(100), None, "ana").await.unwrap();

        let err = svc.open(reais(50), None, "bruno").await.unwrap_err();
        match err {
            ServiceError::AlreadyOpen { register_id } => assert_eq!(register_id, first.id),
            other => panic!("expected AlreadyOpen, got {other:?}"),
        }
        assert_eq!(svc.get_current().await.unwrap().id, first.id);
    }

    #[tokio::test]
    async fn test_negative_opening_balance_writes_nothing() {
        let svc = service().await;
        let err = svc.open(Money::from_cents(-1), None, "ana").await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(matches!(
            svc.get_current().await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_postings_bump_version_and_totals() {
        let svc = service().await;
        svc.open(reais(100), None, "ana").await.unwrap();

        let mut tx = svc.db.begin().await.unwrap();
        svc.record_sale(&mut tx, PaymentMethod::Pix, reais(30)).await.unwrap();
        svc.record_debt_payment(&mut tx, reais(20)).await.unwrap();
        svc.record_expense(&mut tx, reais(5)).await.unwrap();
        tx.commit().await.unwrap();

        let session = svc.get_current().await.unwrap();
        assert_eq!(session.version, 3);
        assert_eq!(session.sales.pix, reais(30));
        assert_eq!(session.sales.total, reais(30));
        assert_eq!(session.payments.received, reais(20));
        assert_eq!(session.payments.made, reais(5));
        assert_eq!(expected_balance(&session), reais(145));
    }

    #[tokio::test]
    async fn test_posting_without_open_register() {
        let svc = service().await;
        let mut tx = svc.db.begin().await.unwrap();
        let err = svc.record_expense(&mut tx, reais(5)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NoOpenRegister));
    }

    #[tokio::test]
    async fn test_close_then_delete() {
        let svc = service().await;
        let opened = svc.open(reais(100), None, "ana").await.unwrap();

        let err = svc.soft_delete(&opened.id, "ana").await.unwrap_err();
        assert!(matches!(err, ServiceError::CannotDeleteOpenRegister { .. }));

        let closed = svc
            .close(reais(100), Some("sem movimento".to_string()), "ana")
            .await
            .unwrap();
        assert_eq!(closed.status, RegisterStatus::Closed);
        assert_eq!(closed.variance, Some(Money::zero()));
        assert_eq!(closed.observations.as_deref(), Some("sem movimento"));

        let summary = svc.summary(&closed.id).await.unwrap();
        assert_eq!(summary.payment_count, 0);
        assert_eq!(summary.expected_balance, reais(100));

        svc.soft_delete(&closed.id, "gerente").await.unwrap();
        assert!(matches!(
            svc.get_by_id(&closed.id).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_close_without_open_register() {
        let svc = service().await;
        let err = svc.close(reais(10), None, "ana").await.unwrap_err();
        assert!(matches!(err, ServiceError::NoOpenRegister));
    }

    #[tokio::test]
    async fn test_reverse_on_closed_session_is_skipped() {
        let svc = service().await;
        svc.open(reais(0), None, "ana").await.unwrap();

        let mut tx = svc.db.begin().await.unwrap();
        let register_id = svc.record_sale(&mut tx, PaymentMethod::Cash, reais(50)).await.unwrap();
        tx.commit().await.unwrap();

        let closed = svc.close(reais(50), None, "ana").await.unwrap();

        let mut tx = svc.db.begin().await.unwrap();
        let posting = Posting::Sale { method: PaymentMethod::Cash, amount: reais(50) };
        assert!(!svc.reverse(&mut tx, &register_id, posting).await.unwrap());
        tx.commit().await.unwrap();

        let after = svc.get_by_id(&closed.id).await.unwrap();
        assert_eq!(after.sales.total, reais(50));
        assert_eq!(after.version, closed.version);
    }
}
