//! # Cash Register Repository
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. OPEN      insert()          status = open, version = 0             │
//! │               (second open trips idx_cash_registers_single_open)       │
//! │                                                                         │
//! │  2. POST      update_totals()   WHERE id AND version AND status='open' │
//! │               version += 1      0 rows → caller re-reads and retries   │
//! │                                                                         │
//! │  3. CLOSE     close()           same version guard, totals frozen      │
//! │                                                                         │
//! │  4. DELETE    soft_delete()     only closed sessions                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::DbResult;
use lente_core::register::{ClosingFigures, RegisterTotals};
use lente_core::{
    CashRegisterSession, Money, MovementTotals, Page, Paginated, RegisterFilter, RegisterStatus,
    SalesTotals,
};

const REGISTER_COLUMNS: &str = r#"
    id, status, opened_at, closed_at,
    opening_balance_cents, closing_balance_cents, expected_balance_cents, variance_cents,
    sales_total_cents, sales_cash_cents, sales_credit_cents, sales_debit_cents,
    sales_pix_cents, sales_bank_slip_cents, sales_promissory_note_cents, sales_check_cents,
    payments_received_cents, payments_made_cents,
    opened_by, closed_by, observations, version,
    is_deleted, deleted_at, deleted_by
"#;

#[derive(Debug, sqlx::FromRow)]
struct RegisterRow {
    id: String,
    status: RegisterStatus,
    opened_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    opening_balance_cents: i64,
    closing_balance_cents: Option<i64>,
    expected_balance_cents: Option<i64>,
    variance_cents: Option<i64>,
    sales_total_cents: i64,
    sales_cash_cents: i64,
    sales_credit_cents: i64,
    sales_debit_cents: i64,
    sales_pix_cents: i64,
    sales_bank_slip_cents: i64,
    sales_promissory_note_cents: i64,
    sales_check_cents: i64,
    payments_received_cents: i64,
    payments_made_cents: i64,
    opened_by: String,
    closed_by: Option<String>,
    observations: Option<String>,
    version: i64,
    is_deleted: bool,
    deleted_at: Option<DateTime<Utc>>,
    deleted_by: Option<String>,
}

impl From<RegisterRow> for CashRegisterSession {
    fn from(row: RegisterRow) -> Self {
        CashRegisterSession {
            id: row.id,
            status: row.status,
            opened_at: row.opened_at,
            closed_at: row.closed_at,
            opening_balance: Money::from_cents(row.opening_balance_cents),
            closing_balance: row.closing_balance_cents.map(Money::from_cents),
            expected_balance: row.expected_balance_cents.map(Money::from_cents),
            variance: row.variance_cents.map(Money::from_cents),
            sales: SalesTotals {
                total: Money::from_cents(row.sales_total_cents),
                cash: Money::from_cents(row.sales_cash_cents),
                credit: Money::from_cents(row.sales_credit_cents),
                debit: Money::from_cents(row.sales_debit_cents),
                pix: Money::from_cents(row.sales_pix_cents),
                bank_slip: Money::from_cents(row.sales_bank_slip_cents),
                promissory_note: Money::from_cents(row.sales_promissory_note_cents),
                check: Money::from_cents(row.sales_check_cents),
            },
            payments: MovementTotals {
                received: Money::from_cents(row.payments_received_cents),
                made: Money::from_cents(row.payments_made_cents),
            },
            opened_by: row.opened_by,
            closed_by: row.closed_by,
            observations: row.observations,
            version: row.version,
            is_deleted: row.is_deleted,
            deleted_at: row.deleted_at,
            deleted_by: row.deleted_by,
        }
    }
}

/// Fields written when a session closes.
#[derive(Debug, Clone)]
pub struct CloseRegister<'a> {
    pub closing_balance: Money,
    pub figures: ClosingFigures,
    pub closed_by: &'a str,
    pub observations: Option<&'a str>,
    pub closed_at: DateTime<Utc>,
}

/// Repository for cash register sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterRepository;

impl RegisterRepository {
    pub fn new() -> Self {
        RegisterRepository
    }

    /// Inserts a freshly opened session.
    ///
    /// Fails with `UniqueViolation { field: "cash_registers.status" }` when
    /// another live session is already open.
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        session: &CashRegisterSession,
    ) -> DbResult<()> {
        debug!(id = %session.id, opened_by = %session.opened_by, "Inserting cash register");

        sqlx::query(
            r#"
            INSERT INTO cash_registers (
                id, status, opened_at, opening_balance_cents,
                opened_by, observations, version, is_deleted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0)
            "#,
        )
        .bind(&session.id)
        .bind(session.status)
        .bind(session.opened_at)
        .bind(session.opening_balance.cents())
        .bind(&session.opened_by)
        .bind(&session.observations)
        .bind(session.version)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Returns the live open session, if any.
    pub async fn find_open(
        &self,
        conn: &mut SqliteConnection,
    ) -> DbResult<Option<CashRegisterSession>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers \
             WHERE status = 'open' AND is_deleted = 0 LIMIT 1"
        );
        let row: Option<RegisterRow> = sqlx::query_as(&sql).fetch_optional(&mut *conn).await?;
        Ok(row.map(Into::into))
    }

    /// Gets a non-deleted session by ID.
    pub async fn get_by_id(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<CashRegisterSession>> {
        let sql = format!(
            "SELECT {REGISTER_COLUMNS} FROM cash_registers WHERE id = ?1 AND is_deleted = 0"
        );
        let row: Option<RegisterRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(Into::into))
    }

    /// Writes new totals if the session is still open at `expected_version`.
    ///
    /// ## Returns
    /// * `true`  - totals written, version bumped
    /// * `false` - version moved or session no longer open; nothing written
    pub async fn update_totals(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        expected_version: i64,
        totals: &RegisterTotals,
    ) -> DbResult<bool> {
        debug!(id = %id, version = expected_version, "Updating register totals");

        let s = &totals.sales;
        let result = sqlx::query(
            r#"
            UPDATE cash_registers SET
                sales_total_cents = ?3,
                sales_cash_cents = ?4,
                sales_credit_cents = ?5,
                sales_debit_cents = ?6,
                sales_pix_cents = ?7,
                sales_bank_slip_cents = ?8,
                sales_promissory_note_cents = ?9,
                sales_check_cents = ?10,
                payments_received_cents = ?11,
                payments_made_cents = ?12,
                version = version + 1
            WHERE id = ?1 AND version = ?2 AND status = 'open' AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(s.total.cents())
        .bind(s.cash.cents())
        .bind(s.credit.cents())
        .bind(s.debit.cents())
        .bind(s.pix.cents())
        .bind(s.bank_slip.cents())
        .bind(s.promissory_note.cents())
        .bind(s.check.cents())
        .bind(totals.payments.received.cents())
        .bind(totals.payments.made.cents())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Closes the session if it is still open at `expected_version`.
    pub async fn close(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        expected_version: i64,
        close: &CloseRegister<'_>,
    ) -> DbResult<bool> {
        debug!(id = %id, closed_by = %close.closed_by, "Closing cash register");

        let result = sqlx::query(
            r#"
            UPDATE cash_registers SET
                status = 'closed',
                closed_at = ?3,
                closing_balance_cents = ?4,
                expected_balance_cents = ?5,
                variance_cents = ?6,
                closed_by = ?7,
                observations = COALESCE(?8, observations),
                version = version + 1
            WHERE id = ?1 AND version = ?2 AND status = 'open' AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(close.closed_at)
        .bind(close.closing_balance.cents())
        .bind(close.figures.expected_balance.cents())
        .bind(close.figures.variance.cents())
        .bind(close.closed_by)
        .bind(close.observations)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Soft-deletes a closed session. Returns `false` if no closed, live
    /// session with that ID exists.
    pub async fn soft_delete(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        deleted_by: &str,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, deleted_by = %deleted_by, "Soft-deleting cash register");

        let result = sqlx::query(
            r#"
            UPDATE cash_registers SET
                is_deleted = 1,
                deleted_at = ?2,
                deleted_by = ?3
            WHERE id = ?1 AND status = 'closed' AND is_deleted = 0
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(deleted_by)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Lists live sessions, newest first.
    pub async fn list(
        &self,
        conn: &mut SqliteConnection,
        filter: &RegisterFilter,
        page: Page,
    ) -> DbResult<Paginated<CashRegisterSession>> {
        let page = page.normalized();

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM cash_registers");
        push_filters(&mut count, filter);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT {REGISTER_COLUMNS} FROM cash_registers"));
        push_filters(&mut select, filter);
        select
            .push(" ORDER BY opened_at DESC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = select.build_query_as::<RegisterRow>().fetch_all(&mut *conn).await?;

        Ok(Paginated {
            items: rows.into_iter().map(Into::into).collect(),
            total,
            page: page.page,
            limit: page.limit,
        })
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &RegisterFilter) {
    qb.push(" WHERE is_deleted = 0");
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filter.from {
        qb.push(" AND opened_at >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND opened_at < ").push_bind(to);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};
    use lente_core::register::Posting;
    use lente_core::PaymentMethod;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn session(opening: i64) -> CashRegisterSession {
        CashRegisterSession::open(Money::from_cents(opening), "ana", None, Utc::now())
    }

    #[tokio::test]
    async fn test_single_open_register_index() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let repo = db.registers();

        repo.insert(&mut conn, &session(10_000)).await.unwrap();
        let err = repo.insert(&mut conn, &session(5_000)).await.unwrap_err();
        assert!(err.is_unique_violation_on("cash_registers.status"), "{err:?}");

        let open = repo.find_open(&mut conn).await.unwrap().unwrap();
        assert_eq!(open.opening_balance.cents(), 10_000);
    }

    #[tokio::test]
    async fn test_update_totals_is_version_checked() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let repo = db.registers();
        let s = session(0);
        repo.insert(&mut conn, &s).await.unwrap();

        let mut totals = RegisterTotals::of(&s);
        totals.apply(Posting::Sale {
            method: PaymentMethod::Pix,
            amount: Money::from_cents(2_500),
        });

        assert!(repo.update_totals(&mut conn, &s.id, 0, &totals).await.unwrap());
        // Stale version is refused.
        assert!(!repo.update_totals(&mut conn, &s.id, 0, &totals).await.unwrap());

        let stored = repo.get_by_id(&mut conn, &s.id).await.unwrap().unwrap();
        assert_eq!(stored.version, 1);
        assert_eq!(stored.sales.pix.cents(), 2_500);
        assert_eq!(stored.sales.total.cents(), 2_500);
    }

    #[tokio::test]
    async fn test_close_freezes_and_allows_delete() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let repo = db.registers();
        let s = session(10_000);
        repo.insert(&mut conn, &s).await.unwrap();

        // Open sessions cannot be soft-deleted.
        assert!(!repo.soft_delete(&mut conn, &s.id, "ana", Utc::now()).await.unwrap());

        let close = CloseRegister {
            closing_balance: Money::from_cents(9_000),
            figures: ClosingFigures {
                expected_balance: Money::from_cents(10_000),
                variance: Money::from_cents(-1_000),
            },
            closed_by: "bruno",
            observations: Some("short 10"),
            closed_at: Utc::now(),
        };
        assert!(repo.close(&mut conn, &s.id, 0, &close).await.unwrap());

        let closed = repo.get_by_id(&mut conn, &s.id).await.unwrap().unwrap();
        assert_eq!(closed.status, RegisterStatus::Closed);
        assert_eq!(closed.variance, Some(Money::from_cents(-1_000)));
        assert_eq!(closed.closed_by.as_deref(), Some("bruno"));

        // Totals of a closed session are frozen.
        let totals = RegisterTotals::of(&closed);
        assert!(!repo.update_totals(&mut conn, &s.id, closed.version, &totals).await.unwrap());

        assert!(repo.soft_delete(&mut conn, &s.id, "ana", Utc::now()).await.unwrap());
        assert!(repo.get_by_id(&mut conn, &s.id).await.unwrap().is_none());

        // A new session can be opened after close.
        repo.insert(&mut conn, &session(0)).await.unwrap();
    }

    #[tokio::test]
    async fn test_negative_opening_balance_rejected_by_schema() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let err = db.registers().insert(&mut conn, &session(-1)).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let db = db().await;
        let mut conn = db.acquire().await.unwrap();
        let repo = db.registers();

        let first = session(100);
        repo.insert(&mut conn, &first).await.unwrap();
        let close = CloseRegister {
            closing_balance: Money::from_cents(100),
            figures: ClosingFigures {
                expected_balance: Money::from_cents(100),
                variance: Money::zero(),
            },
            closed_by: "ana",
            observations: None,
            closed_at: Utc::now(),
        };
        repo.close(&mut conn, &first.id, 0, &close).await.unwrap();
        repo.insert(&mut conn, &session(200)).await.unwrap();

        let all = repo.list(&mut conn, &RegisterFilter::default(), Page::default()).await.unwrap();
        assert_eq!(all.total, 2);

        let open_only = RegisterFilter {
            status: Some(RegisterStatus::Open),
            ..Default::default()
        };
        let open = repo.list(&mut conn, &open_only, Page::default()).await.unwrap();
        assert_eq!(open.total, 1);
        assert_eq!(open.items[0].opening_balance.cents(), 200);
    }
}
