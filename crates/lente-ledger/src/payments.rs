//! # Payment Ledger
//!
//! Creates, confirms, cancels and inspects payments, keeping register
//! totals and order history consistent with them.
//!
//! ## Settlement
//! A payment is *settled* once it is counted into a session's totals and its
//! order's payment history. Settlement happens exactly once:
//!
//! ```text
//! ┌──────────────────────────────┬──────────────┬───────────────────────────┐
//! │ method                       │ status       │ settled                   │
//! ├──────────────────────────────┼──────────────┼───────────────────────────┤
//! │ cash, credit, debit, pix     │ completed    │ at create                 │
//! │ check                        │ pending      │ at create (compensation   │
//! │                              │              │ only completes it later)  │
//! │ bank_slip, promissory_note   │ pending      │ at confirm                │
//! └──────────────────────────────┴──────────────┴───────────────────────────┘
//! ```
//!
//! ## Create Flow
//! ```text
//!  validate ──► BEGIN
//!                 │ find_open                    ── none ──► NO_OPEN_REGISTER
//!                 │ resolve order / client
//!                 │ settles now? ── record_* (CAS on totals)
//!                 │ INSERT payment
//!                 │ settles now? ── order history (or debt allocation)
//!                 │ client_debt plan? ── installments
//!               COMMIT
//!                 │
//!                 └─► post-commit: order payment_status, client total_debt
//!                     (failures logged, never returned)
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use lente_core::debt::{allocate, compute_debt, schedule_installments, Allocation};
use lente_core::register::Posting;
use lente_core::validation::{validate_new_payment, validate_required};
use lente_core::{
    check, ClientKind, CompensationStatus, Money, NewPayment, OrderPayment, OrderStatus, Page,
    Paginated, PaymentDetails, PaymentFilter, PaymentInstallment, PaymentMethod, PaymentStatus,
    PaymentTransaction, PaymentType, ValidationError,
};
use lente_db::Database;

use crate::debt::{ClientDebtUpdate, DebtService};
use crate::error::{ServiceError, ServiceResult};
use crate::register::CashRegisterService;
use crate::settings::LedgerSettings;

/// One day of payments with per-method totals.
#[derive(Debug, Clone, Serialize)]
pub struct DailyPayments {
    pub date: NaiveDate,
    pub payments: Vec<PaymentTransaction>,
    /// Non-cancelled amount per method.
    pub by_method: BTreeMap<PaymentMethod, Money>,
    pub total: Money,
    pub cancelled_count: usize,
}

#[derive(Debug, Clone)]
pub struct PaymentLedger {
    db: Database,
    registers: CashRegisterService,
    debts: DebtService,
}

impl PaymentLedger {
    pub fn new(db: Database, settings: LedgerSettings) -> Self {
        PaymentLedger {
            registers: CashRegisterService::new(db.clone(), settings),
            debts: DebtService::new(db.clone()),
            db,
        }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Records a payment against the open session.
    ///
    /// ## Errors
    /// * `Validation` - bad amount, method/type mix, payload, or order/client
    ///   mismatch; nothing is written
    /// * `NoOpenRegister` - no session to record against
    /// * `NotFound` - referenced order missing
    pub async fn create(&self, input: NewPayment) -> ServiceResult<PaymentTransaction> {
        validate_new_payment(&input)?;

        let method = input.method();
        let now = Utc::now();
        let mut tx = self.db.begin().await?;

        let session = self
            .db
            .registers()
            .find_open(&mut tx)
            .await?
            .ok_or(ServiceError::NoOpenRegister)?;

        let mut payment = PaymentTransaction {
            id: Uuid::new_v4().to_string(),
            amount: input.amount,
            date: input.date.unwrap_or(now),
            payment_type: input.payment_type,
            payment_method: method,
            status: method.initial_status(),
            cash_register_id: session.id,
            settled_register_id: None,
            order_id: input.order_id,
            customer_id: input.customer_id,
            legacy_client_id: input.legacy_client_id,
            institution_id: input.institution_id,
            installments: input.installments,
            description: input.description,
            category: input.category,
            details: input.details,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            cancelled_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        };

        self.attach_order(&mut tx, &mut payment).await?;

        // Debt payments without an order must fit the client's open debt,
        // even when they only settle on confirm.
        let allocations = if payment.payment_type == PaymentType::DebtPayment
            && payment.order_id.is_none()
        {
            let client_id = payment.client_id().unwrap_or_default();
            let orders = self.db.orders().by_client(&mut tx, client_id).await?;
            Some(allocate(payment.amount, &orders)?)
        } else {
            None
        };

        if method.settles_on_creation() {
            let register_id = self.registers.apply_current(&mut tx, posting_of(&payment)).await?;
            payment.settled_register_id = Some(register_id);
        }

        self.db.payments().insert(&mut tx, &payment).await?;

        let mut touched = Vec::new();
        if payment.is_settled() {
            touched = self
                .post_to_orders(&mut tx, &payment, allocations.as_deref())
                .await?;
        }

        if let Some(plan) = payment.details.client_debt().filter(|p| p.generate_debt) {
            let rows = schedule_installments(
                &payment.id,
                payment.amount,
                plan,
                payment.date.date_naive(),
            )?;
            self.db.payments().insert_installments(&mut tx, &rows).await?;
        }

        tx.commit().await?;

        info!(
            payment_id = %payment.id,
            payment_type = ?payment.payment_type,
            method = %method,
            amount = %payment.amount,
            settled = payment.is_settled(),
            "Payment recorded"
        );

        self.after_commit(&touched, payment.client_id()).await;
        Ok(payment)
    }

    /// Checks the referenced order and fills the client from it.
    async fn attach_order(
        &self,
        conn: &mut SqliteConnection,
        payment: &mut PaymentTransaction,
    ) -> ServiceResult<()> {
        let Some(order_id) = payment.order_id.as_deref() else {
            return Ok(());
        };

        let order = self
            .db
            .orders()
            .get_by_id(conn, order_id)
            .await?
            .filter(|o| !o.is_deleted)
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        if order.status == OrderStatus::Cancelled {
            return Err(ValidationError::Conflict {
                field: "order_id".to_string(),
                reason: "order is cancelled".to_string(),
            }
            .into());
        }

        let current = payment.client_id().map(str::to_string);
        match current {
            Some(client) if client != order.client_id => {
                return Err(ValidationError::Conflict {
                    field: "customer_id".to_string(),
                    reason: format!("order {} belongs to another client", order.id),
                }
                .into());
            }
            Some(_) => {}
            None => match order.client_kind {
                ClientKind::Customer => payment.customer_id = Some(order.client_id),
                ClientKind::Legacy => payment.legacy_client_id = Some(order.client_id),
            },
        }

        Ok(())
    }

    /// Appends history rows for a settled payment. Returns the orders touched.
    async fn post_to_orders(
        &self,
        conn: &mut SqliteConnection,
        payment: &PaymentTransaction,
        allocations: Option<&[Allocation]>,
    ) -> ServiceResult<Vec<String>> {
        if payment.payment_type == PaymentType::Expense {
            return Ok(Vec::new());
        }

        let plan: Vec<Allocation> = match (&payment.order_id, allocations) {
            (Some(order_id), _) => vec![Allocation {
                order_id: order_id.clone(),
                amount: payment.amount,
            }],
            (None, Some(plan)) => plan.to_vec(),
            (None, None) => return Ok(Vec::new()),
        };

        let orders = self.db.orders();
        let paid_at = payment.date;
        for slice in &plan {
            let entry = OrderPayment {
                id: Uuid::new_v4().to_string(),
                order_id: slice.order_id.clone(),
                payment_id: Some(payment.id.clone()),
                amount: slice.amount,
                method: payment.payment_method,
                paid_at,
            };
            orders.insert_history(conn, &entry).await?;
        }

        debug!(payment_id = %payment.id, orders = plan.len(), "Payment posted to orders");
        Ok(plan.into_iter().map(|a| a.order_id).collect())
    }

    /// Refreshes order statuses and the client's stored debt. Failures are
    /// logged; the payment itself is already committed.
    async fn after_commit(&self, order_ids: &[String], client_id: Option<&str>) {
        for order_id in order_ids {
            if let Err(e) = self.debts.refresh_order(order_id).await {
                warn!(order_id = %order_id, error = %e, "Order status refresh failed");
            }
        }

        if let Some(client_id) = client_id {
            if let Err(e) = self.debts.recalculate(client_id).await {
                warn!(client_id = %client_id, error = %e, "Client debt refresh failed");
            }
        }
    }

    // =========================================================================
    // Confirm / Cancel / Delete
    // =========================================================================

    /// Settles a pending bank slip or promissory note into the open session.
    pub async fn confirm(&self, id: &str) -> ServiceResult<PaymentTransaction> {
        let payments = self.db.payments();
        let mut tx = self.db.begin().await?;

        let payment = payments
            .get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", id))?;

        if payment.payment_method.settles_on_creation() || payment.status != PaymentStatus::Pending
        {
            return Err(ServiceError::InvalidTransition {
                entity: "payment",
                from: format!("{} {}", payment.payment_method, payment.status.as_str()),
                to: PaymentStatus::Completed.as_str().to_string(),
            });
        }

        let allocations = if payment.payment_type == PaymentType::DebtPayment
            && payment.order_id.is_none()
        {
            let client_id = payment.client_id().unwrap_or_default();
            let orders = self.db.orders().by_client(&mut tx, client_id).await?;
            Some(allocate_capped(&payment, &orders)?)
        } else {
            None
        };

        let register_id = self.registers.apply_current(&mut tx, posting_of(&payment)).await?;
        let now = Utc::now();
        if !payments.mark_settled(&mut tx, id, &register_id, now).await? {
            return Err(ServiceError::Conflict {
                entity: "payment",
                id: id.to_string(),
            });
        }

        let settled = payments
            .get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", id))?;
        let touched = self
            .post_to_orders(&mut tx, &settled, allocations.as_deref())
            .await?;

        tx.commit().await?;

        info!(payment_id = %id, register_id = %register_id, amount = %settled.amount, "Payment confirmed");

        self.after_commit(&touched, settled.client_id()).await;
        Ok(settled)
    }

    /// Cancels a payment, reversing its totals when its session is still open.
    ///
    /// A payment settled into a session that has since closed keeps that
    /// session's totals untouched; the skipped reversal is logged.
    pub async fn cancel(&self, id: &str, cancelled_by: &str) -> ServiceResult<PaymentTransaction> {
        validate_required("cancelled_by", cancelled_by)?;

        let payments = self.db.payments();
        let mut tx = self.db.begin().await?;

        let payment = payments
            .get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", id))?;

        if payment.status == PaymentStatus::Cancelled {
            return Err(ServiceError::AlreadyCancelled {
                payment_id: payment.id,
            });
        }

        let mut reversed = false;
        if let Some(register_id) = payment.settled_register_id.as_deref() {
            reversed = self
                .registers
                .reverse(&mut tx, register_id, posting_of(&payment))
                .await?;
        }

        if !payments.mark_cancelled(&mut tx, id, cancelled_by, Utc::now()).await? {
            return Err(ServiceError::AlreadyCancelled {
                payment_id: id.to_string(),
            });
        }
        let touched = self.db.orders().delete_history_for_payment(&mut tx, id).await?;

        let cancelled = payments
            .get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", id))?;
        tx.commit().await?;

        info!(
            payment_id = %id,
            cancelled_by = %cancelled_by,
            reversed,
            orders = touched.len(),
            "Payment cancelled"
        );

        self.after_commit(&touched, cancelled.client_id()).await;
        Ok(cancelled)
    }

    /// Hides a payment. Register totals and order history are untouched.
    pub async fn soft_delete(&self, id: &str, deleted_by: &str) -> ServiceResult<()> {
        validate_required("deleted_by", deleted_by)?;

        let mut tx = self.db.begin().await?;
        if !self
            .db
            .payments()
            .soft_delete(&mut tx, id, deleted_by, Utc::now())
            .await?
        {
            return Err(ServiceError::not_found("payment", id));
        }
        tx.commit().await?;

        info!(payment_id = %id, deleted_by = %deleted_by, "Payment deleted");
        Ok(())
    }

    // =========================================================================
    // Check Compensation
    // =========================================================================

    /// Moves a check through `pending → compensated | rejected`.
    ///
    /// Compensation completes the payment. Neither outcome touches register
    /// totals; the check was counted when it was received.
    pub async fn update_check_compensation_status(
        &self,
        id: &str,
        status: CompensationStatus,
        reason: Option<&str>,
    ) -> ServiceResult<PaymentTransaction> {
        let payments = self.db.payments();
        let mut tx = self.db.begin().await?;

        let payment = payments
            .get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", id))?;

        let PaymentDetails::Check(current) = &payment.details else {
            return Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec![PaymentMethod::Check.as_str().to_string()],
            }
            .into());
        };

        if payment.status == PaymentStatus::Cancelled {
            return Err(ServiceError::InvalidTransition {
                entity: "payment",
                from: PaymentStatus::Cancelled.as_str().to_string(),
                to: status.as_str().to_string(),
            });
        }

        let mut next = current.clone();
        check::transition(&mut next, status, reason)?;

        let new_status = if next.compensation_status == CompensationStatus::Compensated {
            PaymentStatus::Completed
        } else {
            payment.status
        };

        let updated = payments
            .update_details(
                &mut tx,
                id,
                payment.status,
                &PaymentDetails::Check(next),
                new_status,
                Utc::now(),
            )
            .await?;
        if !updated {
            return Err(ServiceError::Conflict {
                entity: "payment",
                id: id.to_string(),
            });
        }

        let stored = payments
            .get_by_id(&mut tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", id))?;
        tx.commit().await?;

        info!(
            payment_id = %id,
            compensation = status.as_str(),
            status = new_status.as_str(),
            "Check compensation updated"
        );
        Ok(stored)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_by_id(&self, id: &str) -> ServiceResult<PaymentTransaction> {
        let mut conn = self.db.acquire().await?;
        self.db
            .payments()
            .get_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("payment", id))
    }

    pub async fn list(
        &self,
        filter: &PaymentFilter,
        page: Page,
    ) -> ServiceResult<Paginated<PaymentTransaction>> {
        let mut conn = self.db.acquire().await?;
        Ok(self.db.payments().list(&mut conn, filter, page).await?)
    }

    /// Payments dated on `date` (UTC), optionally of one type.
    pub async fn get_daily(
        &self,
        date: NaiveDate,
        payment_type: Option<PaymentType>,
    ) -> ServiceResult<DailyPayments> {
        let (from, to) = day_bounds(date)?;
        let filter = PaymentFilter {
            payment_type,
            from: Some(from),
            to: Some(to),
            ..Default::default()
        };

        let mut conn = self.db.acquire().await?;
        let payments = self.db.payments().list_all(&mut conn, &filter).await?;

        let mut by_method: BTreeMap<PaymentMethod, Money> = BTreeMap::new();
        let mut cancelled_count = 0;
        for payment in &payments {
            if payment.status == PaymentStatus::Cancelled {
                cancelled_count += 1;
                continue;
            }
            *by_method.entry(payment.payment_method).or_default() += payment.amount;
        }
        let total = by_method.values().sum();

        Ok(DailyPayments {
            date,
            payments,
            by_method,
            total,
            cancelled_count,
        })
    }

    /// Installment schedule written for a debt-generating payment.
    pub async fn installments(&self, payment_id: &str) -> ServiceResult<Vec<PaymentInstallment>> {
        let mut conn = self.db.acquire().await?;
        let payments = self.db.payments();

        if payments.get_by_id(&mut conn, payment_id).await?.is_none() {
            return Err(ServiceError::not_found("payment", payment_id));
        }
        Ok(payments.installments(&mut conn, payment_id).await?)
    }

    /// Recomputes stored client debt for one client or all of them.
    pub async fn recalculate_client_debts(
        &self,
        client_id: Option<&str>,
    ) -> ServiceResult<Vec<ClientDebtUpdate>> {
        self.debts.recalculate_clients(client_id).await
    }
}

fn posting_of(payment: &PaymentTransaction) -> Posting {
    Posting::for_payment(payment.payment_type, payment.payment_method, payment.amount)
}

/// Allocation at confirm time. The debt may have shrunk since the payment
/// was created; the money was received anyway, so only what is still owed
/// is posted.
fn allocate_capped(
    payment: &PaymentTransaction,
    orders: &[lente_core::Order],
) -> ServiceResult<Vec<Allocation>> {
    let outstanding = compute_debt(orders).total_debt;
    let amount = payment.amount.min(outstanding);

    if amount < payment.amount {
        warn!(
            payment_id = %payment.id,
            amount = %payment.amount,
            outstanding = %outstanding,
            "Debt payment exceeds outstanding debt, posting the remainder only"
        );
    }
    if amount.is_zero() {
        return Ok(Vec::new());
    }
    Ok(allocate(amount, orders)?)
}

fn day_bounds(date: NaiveDate) -> ServiceResult<(DateTime<Utc>, DateTime<Utc>)> {
    let invalid = || ValidationError::InvalidFormat {
        field: "date".to_string(),
        reason: "date out of range".to_string(),
    };
    let start = date.and_hms_opt(0, 0, 0).ok_or_else(invalid)?.and_utc();
    let end = date
        .checked_add_days(Days::new(1))
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(invalid)?
        .and_utc();
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let (from, to) = day_bounds(date).unwrap();
        assert_eq!(from.to_rfc3339(), "2026-12-31T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2027-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_posting_follows_payment_type() {
        let now = Utc::now();
        let payment = PaymentTransaction {
            id: "p1".to_string(),
            amount: Money::from_cents(2_500),
            date: now,
            payment_type: PaymentType::Expense,
            payment_method: PaymentMethod::Pix,
            status: PaymentStatus::Completed,
            cash_register_id: "r1".to_string(),
            settled_register_id: Some("r1".to_string()),
            order_id: None,
            customer_id: None,
            legacy_client_id: None,
            institution_id: None,
            installments: None,
            description: None,
            category: Some("limpeza".to_string()),
            details: PaymentDetails::Pix,
            created_by: "ana".to_string(),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
            cancelled_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        };
        assert_eq!(
            posting_of(&payment),
            Posting::Expense { amount: Money::from_cents(2_500) }
        );
    }
}
