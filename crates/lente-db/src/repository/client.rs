//! # Client Repository
//!
//! Clients carry a cached `total_debt`. The cache is rewritten from the
//! live order computation; it is never incremented in place.

use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use tracing::debug;

use crate::error::DbResult;
use lente_core::{Client, ClientKind, Money};

#[derive(Debug, sqlx::FromRow)]
struct ClientRow {
    id: String,
    kind: ClientKind,
    name: String,
    total_debt_cents: i64,
    debt_updated_at: Option<DateTime<Utc>>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            kind: row.kind,
            name: row.name,
            total_debt: Money::from_cents(row.total_debt_cents),
            debt_updated_at: row.debt_updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ClientRepository;

impl ClientRepository {
    pub fn new() -> Self {
        ClientRepository
    }

    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        client: &Client,
        created_at: DateTime<Utc>,
    ) -> DbResult<()> {
        debug!(id = %client.id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, kind, name, total_debt_cents, debt_updated_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&client.id)
        .bind(client.kind)
        .bind(&client.name)
        .bind(client.total_debt.cents())
        .bind(client.debt_updated_at)
        .bind(created_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    pub async fn get_by_id(&self, conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(
            "SELECT id, kind, name, total_debt_cents, debt_updated_at FROM clients WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Every client id, for full debt recalculation.
    pub async fn list_ids(&self, conn: &mut SqliteConnection) -> DbResult<Vec<String>> {
        let ids = sqlx::query_scalar::<_, String>("SELECT id FROM clients ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;
        Ok(ids)
    }

    /// Overwrites the cached debt. Returns `false` for an unknown client.
    pub async fn update_total_debt(
        &self,
        conn: &mut SqliteConnection,
        id: &str,
        total_debt: Money,
        at: DateTime<Utc>,
    ) -> DbResult<bool> {
        debug!(id = %id, total_debt = total_debt.cents(), "Storing client debt");

        let result = sqlx::query(
            "UPDATE clients SET total_debt_cents = ?2, debt_updated_at = ?3 WHERE id = ?1",
        )
        .bind(id)
        .bind(total_debt.cents())
        .bind(at)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};

    fn client(id: &str) -> Client {
        Client {
            id: id.to_string(),
            kind: ClientKind::Legacy,
            name: "Jorge".to_string(),
            total_debt: Money::zero(),
            debt_updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_update_total_debt() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let repo = db.clients();

        repo.insert(&mut conn, &client("c1"), Utc::now()).await.unwrap();
        assert!(repo
            .update_total_debt(&mut conn, "c1", Money::from_cents(7_500), Utc::now())
            .await
            .unwrap());

        let stored = repo.get_by_id(&mut conn, "c1").await.unwrap().unwrap();
        assert_eq!(stored.total_debt.cents(), 7_500);
        assert!(stored.debt_updated_at.is_some());
        assert_eq!(repo.list_ids(&mut conn).await.unwrap(), vec!["c1".to_string()]);
    }

    #[tokio::test]
    async fn test_negative_debt_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let repo = db.clients();

        repo.insert(&mut conn, &client("c1"), Utc::now()).await.unwrap();
        let err = repo
            .update_total_debt(&mut conn, "c1", Money::from_cents(-1), Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
