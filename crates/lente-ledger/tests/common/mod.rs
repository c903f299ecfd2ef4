//! Shared setup for ledger integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use lente_core::{
    BankSlipDetails, CheckDetails, Client, ClientDebtPlan, ClientKind, CompensationStatus, Money,
    NewPayment, Order, OrderPaymentStatus, OrderStatus, PaymentDetails, PaymentType,
    PromissoryNoteDetails,
};
use lente_db::{Database, DbConfig};
use lente_ledger::{Ledger, LedgerSettings};

pub struct TestLedger {
    pub db: Database,
    pub ledger: Ledger,
    file: Option<PathBuf>,
}

pub async fn setup() -> TestLedger {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let ledger = Ledger::new(db.clone(), LedgerSettings::default());
    TestLedger { db, ledger, file: None }
}

/// File-backed database with a real pool, for tests where writers race.
pub async fn setup_on_disk(connections: u32) -> TestLedger {
    let path = std::env::temp_dir().join(format!("lente-test-{}.db", Uuid::new_v4()));
    let db = Database::new(DbConfig::new(&path).max_connections(connections))
        .await
        .unwrap();
    let ledger = Ledger::new(db.clone(), LedgerSettings::default());
    TestLedger {
        db,
        ledger,
        file: Some(path),
    }
}

impl Drop for TestLedger {
    fn drop(&mut self) {
        if let Some(path) = &self.file {
            for suffix in ["", "-wal", "-shm"] {
                let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
            }
        }
    }
}

pub fn reais(r: i64) -> Money {
    Money::from_cents(r * 100)
}

impl TestLedger {
    pub async fn add_client(&self, id: &str) {
        let mut conn = self.db.acquire().await.unwrap();
        let client = Client {
            id: id.to_string(),
            kind: ClientKind::Customer,
            name: format!("Cliente {id}"),
            total_debt: Money::zero(),
            debt_updated_at: None,
        };
        self.db.clients().insert(&mut conn, &client, Utc::now()).await.unwrap();
    }

    /// Inserts an open order; `age_days` orders allocation oldest first.
    pub async fn add_order(&self, id: &str, client_id: &str, price: Money, age_days: i64) {
        let mut conn = self.db.acquire().await.unwrap();
        let order = Order {
            id: id.to_string(),
            client_id: client_id.to_string(),
            client_kind: ClientKind::Customer,
            final_price: price,
            payment_entry: Money::zero(),
            status: OrderStatus::Open,
            payment_status: OrderPaymentStatus::Pending,
            payment_history: Vec::new(),
            is_deleted: false,
            created_at: Utc::now() - Duration::days(age_days),
        };
        self.db.orders().insert(&mut conn, &order).await.unwrap();
    }

    pub async fn order(&self, id: &str) -> Order {
        let mut conn = self.db.acquire().await.unwrap();
        self.db.orders().get_by_id(&mut conn, id).await.unwrap().unwrap()
    }

    pub async fn client(&self, id: &str) -> Client {
        let mut conn = self.db.acquire().await.unwrap();
        self.db.clients().get_by_id(&mut conn, id).await.unwrap().unwrap()
    }
}

pub fn cash_sale(amount: Money) -> NewPayment {
    NewPayment::new(amount, PaymentType::Sale, PaymentDetails::Cash, "ana")
}

pub fn sale_for_order(amount: Money, details: PaymentDetails, order_id: &str) -> NewPayment {
    let mut input = NewPayment::new(amount, PaymentType::Sale, details, "ana");
    input.order_id = Some(order_id.to_string());
    input
}

pub fn debt_payment(amount: Money, details: PaymentDetails, client_id: &str) -> NewPayment {
    let mut input = NewPayment::new(amount, PaymentType::DebtPayment, details, "ana");
    input.customer_id = Some(client_id.to_string());
    input
}

pub fn expense(amount: Money, category: &str) -> NewPayment {
    let mut input = NewPayment::new(amount, PaymentType::Expense, PaymentDetails::Pix, "ana");
    input.category = Some(category.to_string());
    input
}

pub fn check_details() -> PaymentDetails {
    PaymentDetails::Check(CheckDetails {
        bank: "001".to_string(),
        check_number: "850013".to_string(),
        check_date: NaiveDate::from_ymd_opt(2026, 11, 5).unwrap(),
        account_holder: "Rita Moraes".to_string(),
        branch: "3321".to_string(),
        account_number: "40021-7".to_string(),
        presentation_date: None,
        compensation_status: CompensationStatus::Pending,
        rejection_reason: None,
    })
}

pub fn bank_slip() -> PaymentDetails {
    PaymentDetails::BankSlip(BankSlipDetails::default())
}

pub fn promissory_note_with_debt(installments: u32) -> PaymentDetails {
    PaymentDetails::PromissoryNote(PromissoryNoteDetails {
        number: Some("NP-77".to_string()),
        client_debt: Some(ClientDebtPlan {
            generate_debt: true,
            installments,
            due_dates: Vec::new(),
        }),
    })
}
