//! # Debt Service
//!
//! Loads a client's orders and applies the pure rules from
//! [`lente_core::debt`] and [`lente_core::order_status`].
//!
//! ```text
//!   orders + history ──► compute_debt ──► clients.total_debt   (cache)
//!   order + history  ──► resolve_order ──► orders.payment_status
//! ```
//!
//! The stored debt is a cache of the computed value: recomputing twice
//! writes the same figure, and concurrent recomputations are last writer
//! wins.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use lente_core::debt::{compute_debt, DebtReport};
use lente_core::order_status::resolve_order;
use lente_core::{Money, OrderPaymentStatus};
use lente_db::Database;

use crate::error::{ServiceError, ServiceResult};

/// Stored debt after a recalculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientDebtUpdate {
    pub client_id: String,
    pub total_debt: Money,
}

#[derive(Debug, Clone)]
pub struct DebtService {
    db: Database,
}

impl DebtService {
    pub fn new(db: Database) -> Self {
        DebtService { db }
    }

    /// Computes the client's debt without storing it.
    pub async fn compute_debt(&self, client_id: &str) -> ServiceResult<DebtReport> {
        let mut conn = self.db.acquire().await?;

        if self.db.clients().get_by_id(&mut conn, client_id).await?.is_none() {
            return Err(ServiceError::not_found("client", client_id));
        }

        let orders = self.db.orders().by_client(&mut conn, client_id).await?;
        Ok(compute_debt(&orders))
    }

    /// Recomputes and stores one client's debt.
    pub async fn recalculate(&self, client_id: &str) -> ServiceResult<ClientDebtUpdate> {
        let mut tx = self.db.begin().await?;

        let orders = self.db.orders().by_client(&mut tx, client_id).await?;
        let report = compute_debt(&orders);

        let stored = self
            .db
            .clients()
            .update_total_debt(&mut tx, client_id, report.total_debt, Utc::now())
            .await?;
        if !stored {
            return Err(ServiceError::not_found("client", client_id));
        }
        tx.commit().await?;

        debug!(client_id = %client_id, total_debt = %report.total_debt, "Client debt stored");

        Ok(ClientDebtUpdate {
            client_id: client_id.to_string(),
            total_debt: report.total_debt,
        })
    }

    /// Recomputes one client, or every client when `client_id` is `None`.
    pub async fn recalculate_clients(
        &self,
        client_id: Option<&str>,
    ) -> ServiceResult<Vec<ClientDebtUpdate>> {
        let ids = match client_id {
            Some(id) => vec![id.to_string()],
            None => {
                let mut conn = self.db.acquire().await?;
                self.db.clients().list_ids(&mut conn).await?
            }
        };

        let mut updates = Vec::with_capacity(ids.len());
        for id in &ids {
            updates.push(self.recalculate(id).await?);
        }

        info!(clients = updates.len(), "Client debts recalculated");
        Ok(updates)
    }

    /// Re-resolves and stores an order's payment status.
    pub async fn refresh_order(&self, order_id: &str) -> ServiceResult<OrderPaymentStatus> {
        let orders = self.db.orders();
        let mut tx = self.db.begin().await?;

        let order = orders
            .get_by_id(&mut tx, order_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order", order_id))?;

        let status = resolve_order(&order);
        if status != order.payment_status {
            orders
                .update_payment_status(&mut tx, order_id, status, Utc::now())
                .await?;
            tx.commit().await?;
            info!(
                order_id = %order_id,
                from = ?order.payment_status,
                to = ?status,
                "Order payment status changed"
            );
        }

        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lente_core::{Client, ClientKind, Order, OrderPayment, OrderStatus, PaymentMethod};
    use lente_db::DbConfig;

    fn reais(r: i64) -> Money {
        Money::from_cents(r * 100)
    }

    fn order(id: &str, price: i64, paid: &[i64]) -> Order {
        Order {
            id: id.to_string(),
            client_id: "c1".to_string(),
            client_kind: ClientKind::Customer,
            final_price: reais(price),
            payment_entry: Money::zero(),
            status: OrderStatus::Open,
            payment_status: OrderPaymentStatus::Pending,
            payment_history: paid
                .iter()
                .enumerate()
                .map(|(i, amount)| OrderPayment {
                    id: format!("{id}-h{i}"),
                    order_id: id.to_string(),
                    payment_id: None,
                    amount: reais(*amount),
                    method: PaymentMethod::Cash,
                    paid_at: Utc::now(),
                })
                .collect(),
            is_deleted: false,
            created_at: Utc::now(),
        }
    }

    async fn seeded(orders: &[Order]) -> DebtService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        {
            let mut conn = db.acquire().await.unwrap();
            let client = Client {
                id: "c1".to_string(),
                kind: ClientKind::Customer,
                name: "Helena".to_string(),
                total_debt: Money::zero(),
                debt_updated_at: None,
            };
            db.clients().insert(&mut conn, &client, Utc::now()).await.unwrap();
            for o in orders {
                db.orders().insert(&mut conn, o).await.unwrap();
            }
        }
        DebtService::new(db)
    }

    #[tokio::test]
    async fn test_recalculate_is_idempotent() {
        let svc = seeded(&[order("o1", 100, &[40]), order("o2", 50, &[50])]).await;

        let first = svc.recalculate("c1").await.unwrap();
        let second = svc.recalculate("c1").await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total_debt, reais(60));

        let report = svc.compute_debt("c1").await.unwrap();
        assert_eq!(report.total_debt, reais(60));
        assert_eq!(report.orders.len(), 1);
    }

    #[tokio::test]
    async fn test_overpaid_orders_never_go_negative() {
        let svc = seeded(&[order("o1", 100, &[150])]).await;
        let updates = svc.recalculate_clients(None).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].total_debt, Money::zero());
    }

    #[tokio::test]
    async fn test_refresh_order_resolves_status() {
        let svc = seeded(&[order("o1", 100, &[40]), order("o2", 100, &[])]).await;
        assert_eq!(
            svc.refresh_order("o1").await.unwrap(),
            OrderPaymentStatus::PartiallyPaid
        );
        assert_eq!(svc.refresh_order("o2").await.unwrap(), OrderPaymentStatus::Pending);
        assert!(matches!(
            svc.refresh_order("missing").await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_client() {
        let svc = seeded(&[]).await;
        assert!(matches!(
            svc.recalculate("ghost").await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
        assert!(matches!(
            svc.compute_debt("ghost").await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }
}
