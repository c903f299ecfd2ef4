//! # Order Repository
//!
//! The settlement engine's view of orders: price, entry, lifecycle status
//! and payment history. Orders are owned elsewhere; the ledger only appends
//! and removes history rows and writes back `payment_status`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use lente_core::{
    ClientKind, Money, Order, OrderPayment, OrderPaymentStatus, OrderStatus, PaymentMethod,
};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: String,
    client_id: String,
    client_kind: ClientKind,
    final_price_cents: i64,
    payment_entry_cents: i64,
    status: OrderStatus,
    payment_status: OrderPaymentStatus,
    is_deleted: bool,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, payment_history: Vec<OrderPayment>) -> Order {
        Order {
            id: self.id,
            client_id: self.client_id,
            client_kind: self.client_kind,
            final_price: Money::from_cents(self.final_price_cents),
            payment_entry: Money::from_cents(self.payment_entry_cents),
            status: self.status,
            payment_status: self.payment_status,
            payment_history,
            is_deleted: self.is_deleted,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct HistoryRow {
    id: String,
    order_id: String,
    payment_id: Option<String>,
    amount_cents: i64,
    method: PaymentMethod,
    paid_at: DateTime<Utc>,
}

impl From<HistoryRow> for OrderPayment {
    fn from(row: HistoryRow) -> Self {
        OrderPayment {
            id: row.id,
            order_id: row.order_id,
            payment_id: row.payment_id,
            amount: Money::from_cents(row.amount_cents),
            method: row.method,
            paid_at: row.paid_at,
        }
    }
}

/// Repository for orders and their payment history.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderRepository;

impl OrderRepository {
    pub fn new() -> Self {
        OrderRepository
    }

    /// Inserts an order together with any history it already carries.
    pub async fn insert(&self, conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, client_id = %order.client_id, "Inserting order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, client_id, client_kind, final_price_cents, payment_entry_cents,
                status, payment_status, is_deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.client_id)
        .bind(order.client_kind)
        .bind(order.final_price.cents())
        .bind(order.payment_entry.cents())
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.is_deleted)
        .bind(order.created_at)
        .execute(&mut *conn)
        .await?;

        for entry in &order.payment_history {
            self.insert_history(conn, entry).await?;
        }

        Ok(())
    }

    /// Gets an order and its history. Deleted orders are returned with
    /// `is_deleted` set so callers can decide.
    pub async fn get_by_id(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, client_id, client_kind, final_price_cents, payment_entry_cents,
                   status, payment_status, is_deleted, created_at
            FROM orders WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let history: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, payment_id, amount_cents, method, paid_at
            FROM order_payments WHERE order_id = ?1
            ORDER BY paid_at
            "#,
        )
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(Some(row.into_order(history.into_iter().map(Into::into).collect())))
    }

    /// All orders of a client (any status), oldest first, with history.
    pub async fn by_client(&self, conn: &mut SqliteConnection, client_id: &str) -> DbResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, client_id, client_kind, final_price_cents, payment_entry_cents,
                   status, payment_status, is_deleted, created_at
            FROM orders WHERE client_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(client_id)
        .fetch_all(&mut *conn)
        .await?;

        let history: Vec<HistoryRow> = sqlx::query_as(
            r#"
            SELECT op.id, op.order_id, op.payment_id, op.amount_cents, op.method, op.paid_at
            FROM order_payments op
            JOIN orders o ON o.id = op.order_id
            WHERE o.client_id = ?1
            ORDER BY op.paid_at
            "#,
        )
        .bind(client_id)
        .fetch_all(&mut *conn)
        .await?;

        let mut by_order: HashMap<String, Vec<OrderPayment>> = HashMap::new();
        for entry in history {
            by_order
                .entry(entry.order_id.clone())
                .or_default()
                .push(entry.into());
        }

        debug!(client_id = %client_id, orders = rows.len(), "Loaded client orders");

        Ok(rows
            .into_iter()
            .map(|row| {
                let entries = by_order.remove(&row.id).unwrap_or_default();
                row.into_order(entries)
            })
            .collect())
    }

    /// Appends one payment-history row.
    pub async fn insert_history(&self, conn: &mut SqliteConnection, entry: &OrderPayment) -> DbResult<()> {
        debug!(
            order_id = %entry.order_id,
            amount = entry.amount.cents(),
            "Appending order payment history"
        );

        sqlx::query(
            r#"
            INSERT INTO order_payments (id, order_id, payment_id, amount_cents, method, paid_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.order_id)
        .bind(&entry.payment_id)
        .bind(entry.amount.cents())
        .bind(entry.method)
        .bind(entry.paid_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Removes every history row produced by a ledger payment and returns
    /// the affected order ids.
    pub async fn delete_history_for_payment(
        &self,
        conn: &mut SqliteConnection,
        payment_id: &str,
    ) -> DbResult<Vec<String>> {
        let order_ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT order_id FROM order_payments WHERE payment_id = ?1",
        )
        .bind(payment_id)
        .fetch_all(&mut *conn)
        .await?;

        sqlx::query("DELETE FROM order_payments WHERE payment_id = ?1")
            .bind(payment_id)
            .execute(&mut *conn)
            .await?;

        debug!(payment_id = %payment_id, orders = order_ids.len(), "Removed order payment history");
        Ok(order_ids)
    }

    /// Writes back the resolved payment status. Returns `false` for an
    /// unknown order.
    pub async fn update_payment_status(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        status: OrderPaymentStatus,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE orders SET payment_status = ?2, updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
