//! # Seed Data Generator
//!
//! Populates a development database with clients, open orders and an open
//! cash register session.
//!
//! ## Usage
//! ```bash
//! # 20 clients (default)
//! cargo run -p lente-db --bin seed
//!
//! # Custom amount and database path
//! cargo run -p lente-db --bin seed -- --clients 200 --db ./data/lente.db
//! ```
//!
//! ## Generated Data
//! - Clients alternate between `customer` and `legacy`
//! - Each client gets 1-3 orders priced R$ 150,00 - R$ 1.349,00
//! - Some orders carry a down payment, so debts vary
//! - One open session with an opening balance of R$ 200,00

use chrono::{Duration, Utc};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use lente_core::{
    order_status, CashRegisterSession, Client, ClientKind, Money, Order, OrderPaymentStatus,
    OrderStatus,
};
use lente_db::{Database, DbConfig};

const FIRST_NAMES: &[&str] = &[
    "Ana", "Bruno", "Carla", "Diego", "Elisa", "Fábio", "Gabriela", "Heitor", "Isabela", "João",
];

const LAST_NAMES: &[&str] = &[
    "Silva", "Souza", "Oliveira", "Santos", "Pereira", "Lima", "Costa", "Ribeiro",
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lente=debug,sqlx=warn"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut clients: usize = 20;
    let mut db_path = String::from("./lente_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--clients" | "-c" => {
                if i + 1 < args.len() {
                    clients = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Lente Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --clients <N>  Number of clients to generate (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./lente_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    info!(db = %db_path, clients, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let mut tx = db.begin().await?;

    if !db.clients().list_ids(&mut tx).await?.is_empty() {
        warn!("Database already has clients; delete the file to regenerate");
        return Ok(());
    }

    let now = Utc::now();
    let mut orders = 0usize;
    let mut total_debt = Money::zero();

    for n in 0..clients {
        let mut client = Client {
            id: Uuid::new_v4().to_string(),
            kind: if n % 2 == 0 { ClientKind::Customer } else { ClientKind::Legacy },
            name: format!(
                "{} {}",
                FIRST_NAMES[n % FIRST_NAMES.len()],
                LAST_NAMES[(n * 7) % LAST_NAMES.len()]
            ),
            total_debt: Money::zero(),
            debt_updated_at: Some(now),
        };

        let generated: Vec<Order> = (0..1 + n % 3)
            .map(|k| generate_order(&client, n * 3 + k, now))
            .collect();
        client.total_debt = lente_core::debt::compute_debt(&generated).total_debt;
        total_debt += client.total_debt;

        db.clients().insert(&mut tx, &client, now).await?;
        for order in &generated {
            db.orders().insert(&mut tx, order).await?;
        }
        orders += generated.len();
    }

    let session = CashRegisterSession::open(Money::from_cents(20_000), "seed", None, now);
    db.registers().insert(&mut tx, &session).await?;

    tx.commit().await?;

    info!(
        clients,
        orders,
        total_debt = %total_debt,
        register_id = %session.id,
        "Seed complete"
    );

    Ok(())
}

/// Generates one order with a deterministic price and down payment.
fn generate_order(client: &Client, seed: usize, now: chrono::DateTime<Utc>) -> Order {
    let final_price = Money::from_cents(15_000 + ((seed * 3_700) % 120_000) as i64);
    let payment_entry = match seed % 4 {
        0 => Money::zero(),
        1 => Money::from_cents(final_price.cents() / 2),
        2 => final_price,
        _ => Money::from_cents(5_000),
    };

    let mut order = Order {
        id: Uuid::new_v4().to_string(),
        client_id: client.id.clone(),
        client_kind: client.kind,
        final_price,
        payment_entry,
        status: if seed % 5 == 0 { OrderStatus::Delivered } else { OrderStatus::Open },
        payment_status: OrderPaymentStatus::Pending,
        payment_history: Vec::new(),
        is_deleted: false,
        created_at: now - Duration::days((seed % 60) as i64),
    };
    order.payment_status = order_status::resolve_order(&order);
    order
}
