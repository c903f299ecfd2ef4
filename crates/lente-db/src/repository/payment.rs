//! # Payment Repository
//!
//! Storage for the payment ledger and generated installment schedules.
//!
//! ## Row Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  payments                                                               │
//! │  ├── amount_cents, paid_at, payment_type, payment_method, status       │
//! │  ├── cash_register_id      session open at creation                    │
//! │  ├── settled_register_id   session whose totals carry the payment      │
//! │  ├── details               tagged JSON payload (PaymentDetails)        │
//! │  └── compensation_status   copy of the check status, for filtering     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Status changes are guarded in SQL (`WHERE status = 'pending'`, `WHERE
//! status != 'cancelled'`) so two concurrent cancels can't both succeed.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::{DbError, DbResult};
use lente_core::{
    CompensationStatus, Installments, Money, Page, Paginated, PaymentDetails, PaymentFilter,
    PaymentInstallment, PaymentMethod, PaymentStatus, PaymentTransaction, PaymentType,
};

const PAYMENT_COLUMNS: &str = r#"
    id, amount_cents, paid_at, payment_type, payment_method, status,
    cash_register_id, settled_register_id,
    order_id, customer_id, legacy_client_id, institution_id,
    installment_current, installment_total, installment_value_cents,
    description, category, details,
    created_by, created_at, updated_at, cancelled_at, cancelled_by,
    is_deleted, deleted_at, deleted_by
"#;

#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: String,
    amount_cents: i64,
    paid_at: DateTime<Utc>,
    payment_type: PaymentType,
    payment_method: PaymentMethod,
    status: PaymentStatus,
    cash_register_id: String,
    settled_register_id: Option<String>,
    order_id: Option<String>,
    customer_id: Option<String>,
    legacy_client_id: Option<String>,
    institution_id: Option<String>,
    installment_current: Option<i64>,
    installment_total: Option<i64>,
    installment_value_cents: Option<i64>,
    description: Option<String>,
    category: Option<String>,
    details: String,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
    cancelled_by: Option<String>,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<String>,
}

impl TryFrom<PaymentRow> for PaymentTransaction {
    type Error = DbError;

    fn try_from(row: PaymentRow) -> DbResult<Self> {
        let details: PaymentDetails =
            serde_json::from_str(&row.details).map_err(|e| DbError::Corrupt {
                entity: "payment",
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        let installments = match (
            row.installment_current,
            row.installment_total,
            row.installment_value_cents,
        ) {
            (Some(current), Some(total), Some(value)) => Some(Installments {
                current: current as u32,
                total: total as u32,
                value: Money::from_cents(value),
            }),
            _ => None,
        };

        Ok(PaymentTransaction {
            id: row.id,
            amount: Money::from_cents(row.amount_cents),
            date: row.paid_at,
            payment_type: row.payment_type,
            payment_method: row.payment_method,
            status: row.status,
            cash_register_id: row.cash_register_id,
            settled_register_id: row.settled_register_id,
            order_id: row.order_id,
            customer_id: row.customer_id,
            legacy_client_id: row.legacy_client_id,
            institution_id: row.institution_id,
            installments,
            description: row.description,
            category: row.category,
            details,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            cancelled_at: row.cancelled_at,
            cancelled_by: row.cancelled_by,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by,
        })
    }
}

fn details_json(id: &str, details: &PaymentDetails) -> DbResult<String> {
    serde_json::to_string(details).map_err(|e| DbError::Corrupt {
        entity: "payment",
        id: id.to_string(),
        reason: e.to_string(),
    })
}

/// Count and amount of settled payments for one method in a session.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct MethodBreakdown {
    pub payment_method: PaymentMethod,
    pub payment_type: PaymentType,
    pub count: i64,
    pub amount_cents: i64,
}

#[derive(Debug, sqlx::FromRow)]
struct InstallmentRow {
    id: String,
    payment_id: String,
    number: i64,
    total: i64,
    amount_cents: i64,
    due_date: NaiveDate,
}

/// Repository for the payment ledger.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn new() -> Self {
        PaymentRepository
    }

    /// Inserts a payment row.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        payment: &PaymentTransaction,
    ) -> DbResult<()> {
        debug!(
            id = %payment.id,
            method = %payment.payment_method,
            amount = payment.amount.cents(),
            "Inserting payment"
        );

        let details = details_json(&payment.id, &payment.details)?;
        let compensation = payment.details.compensation_status();
        let installments = payment.installments;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, amount_cents, paid_at, payment_type, payment_method, status,
                cash_register_id, settled_register_id,
                order_id, customer_id, legacy_client_id, institution_id,
                installment_current, installment_total, installment_value_cents,
                description, category, details, compensation_status,
                created_by, created_at, updated_at, is_deleted
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12,
                ?13, ?14, ?15,
                ?16, ?17, ?18, ?19,
                ?20, ?21, ?22, 0
            )
            "#,
        )
        .bind(&payment.id)
        .bind(payment.amount.cents())
        .bind(payment.date)
        .bind(payment.payment_type)
        .bind(payment.payment_method)
        .bind(payment.status)
        .bind(&payment.cash_register_id)
        .bind(&payment.settled_register_id)
        .bind(&payment.order_id)
        .bind(&payment.customer_id)
        .bind(&payment.legacy_client_id)
        .bind(&payment.institution_id)
        .bind(installments.map(|i| i64::from(i.current)))
        .bind(installments.map(|i| i64::from(i.total)))
        .bind(installments.map(|i| i.value.cents()))
        .bind(&payment.description)
        .bind(&payment.category)
        .bind(details)
        .bind(compensation)
        .bind(&payment.created_by)
        .bind(payment.created_at)
        .bind(payment.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Gets a non-deleted payment by ID.
    pub async fn get_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<PaymentTransaction>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1 AND is_deleted = 0");
        let row: Option<PaymentRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        row.map(TryInto::try_into).transpose()
    }

    /// Moves a pending payment to completed and records the session whose
    /// totals now carry it. Returns `false` if the payment was not pending.
    pub async fn mark_settled(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        register_id: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, register_id = %register_id, "Settling payment");

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = 'completed',
                settled_register_id = ?2,
                updated_at = ?3
            WHERE id = ?1 AND status = 'pending' AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(register_id)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Cancels a payment. Returns `false` if it was already cancelled.
    pub async fn mark_cancelled(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        cancelled_by: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, cancelled_by = %cancelled_by, "Cancelling payment");

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                status = 'cancelled',
                cancelled_at = ?2,
                cancelled_by = ?3,
                updated_at = ?2
            WHERE id = ?1 AND status != 'cancelled' AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(cancelled_by)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Rewrites the method payload and status, guarded on the status the
    /// caller read. Returns `false` if the row changed underneath.
    pub async fn update_details(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        expected_status: PaymentStatus,
        details: &PaymentDetails,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, status = status.as_str(), "Updating payment details");

        let json = details_json(id, details)?;
        let result = sqlx::query(
            r#"
            UPDATE payments SET
                details = ?3,
                compensation_status = ?4,
                status = ?5,
                updated_at = ?6
            WHERE id = ?1 AND status = ?2 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(expected_status)
        .bind(json)
        .bind(details.compensation_status())
        .bind(status)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Hides a payment from reads. Totals are untouched.
    pub async fn soft_delete(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        deleted_by: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, deleted_by = %deleted_by, "Soft-deleting payment");

        let result = sqlx::query(
            r#"
            UPDATE payments SET
                is_deleted = 1,
                deleted_at = ?2,
                deleted_by = ?3
            WHERE id = ?1 AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(deleted_by)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists payments matching `filter`, newest first.
    pub async fn list(
        &self,
        conn: &mut SqliteConnection,
        filter: &PaymentFilter,
        page: Page,
    ) -> DbResult<Paginated<PaymentTransaction>> {
        let page = page.normalized();

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM payments");
        push_filters(&mut count, filter);
        let total = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments"));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY paid_at DESC, created_at DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select.build_query_as::<PaymentRow>().fetch_all(&mut *conn).await?;
        let items = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<DbResult<Vec<PaymentTransaction>>>()?;

        Ok(Paginated {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    /// All payments matching `filter`, oldest first, without paging.
    pub async fn list_all(
        &self,
        conn: &mut SqliteConnection,
        filter: &PaymentFilter,
    ) -> DbResult<Vec<PaymentTransaction>> {
        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments"));
        push_filters(&mut select, filter);
        select.push(" ORDER BY paid_at ASC, created_at ASC");

        let rows = select.build_query_as::<PaymentRow>().fetch_all(&mut *conn).await?;
        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Per-method count and sum of payments settled into a session and not
    /// cancelled.
    pub async fn settled_breakdown(
        &self,
        conn: &mut SqliteConnection,
        register_id: &str,
    ) -> DbResult<Vec<MethodBreakdown>> {
        let rows = sqlx::query_as::<_, MethodBreakdown>(
            r#"
            SELECT
                payment_method,
                payment_type,
                COUNT(*) AS count,
                COALESCE(SUM(amount_cents), 0) AS amount_cents
            FROM payments
            WHERE settled_register_id = ?1 AND status != 'cancelled' AND is_deleted = 0
            GROUP BY payment_method, payment_type
            ORDER BY payment_type, payment_method
            "#,
        )
        .bind(register_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    /// Number of cancelled payments recorded against a session.
    pub async fn count_cancelled(
        &self,
        conn: &mut SqliteConnection,
        register_id: &str,
    ) -> DbResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM payments
            WHERE (cash_register_id = ?1 OR settled_register_id = ?1)
              AND status = 'cancelled' AND is_deleted = 0
            "#,
        )
        .bind(register_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    // =========================================================================
    // Installments
    // =========================================================================

    pub async fn insert_installments(
        &self,
        conn: &mut SqliteConnection,
        rows: &[PaymentInstallment],
    ) -> DbResult<()> {
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO payment_installments (id, payment_id, number, total, amount_cents, due_date)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&row.id)
            .bind(&row.payment_id)
            .bind(i64::from(row.number))
            .bind(i64::from(row.total))
            .bind(row.amount.cents())
            .bind(row.due_date)
            .execute(&mut *conn)
            .await?;
        }

        debug!(count = rows.len(), "Inserted installment schedule");
        Ok(())
    }

    pub async fn installments(
        &self,
        conn: &mut SqliteConnection,
        payment_id: &str,
    ) -> DbResult<Vec<PaymentInstallment>> {
        let rows = sqlx::query_as::<_, InstallmentRow>(
            r#"
            SELECT id, payment_id, number, total, amount_cents, due_date
            FROM payment_installments
            WHERE payment_id = ?1
            ORDER BY number
            "#,
        )
        .bind(payment_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| PaymentInstallment {
                id: r.id,
                payment_id: r.payment_id,
                number: r.number as u32,
                total: r.total as u32,
                amount: Money::from_cents(r.amount_cents),
                due_date: r.due_date,
            })
            .collect())
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PaymentFilter) {
    qb.push(" WHERE is_deleted = 0");
    if let Some(payment_type) = filter.payment_type {
        qb.push(" AND payment_type = ").push_bind(payment_type);
    }
    if let Some(method) = filter.method {
        qb.push(" AND payment_method = ").push_bind(method);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(register_id) = &filter.cash_register_id {
        qb.push(" AND cash_register_id = ").push_bind(register_id.clone());
    }
    if let Some(from) = filter.from {
        qb.push(" AND paid_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND paid_at < ").push_bind(to);
    }
    if let Some(customer_id) = &filter.customer_id {
        qb.push(" AND customer_id = ").push_bind(customer_id.clone());
    }
    if let Some(compensation) = filter.compensation_status {
        qb.push(" AND compensation_status = ").push_bind(compensation);
    }
}

/// Filter for checks in a given compensation state.
pub fn compensation_filter(status: CompensationStatus) -> PaymentFilter {
    PaymentFilter {
        method: Some(PaymentMethod::Check),
        compensation_status: Some(status),
        ..Default::default()
    }
}

// =============================================================================
// Tests
// =============================================================================
