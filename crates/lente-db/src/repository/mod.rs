//! # Repository Module
//!
//! Database repository implementations for Lente settlement.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Transactions                        │
//! │                                                                         │
//! │  PaymentLedger::create                                                  │
//! │       │                                                                 │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       ▼                                                                 │
//! │  db.payments().insert(&mut tx, &payment)                               │
//! │  db.registers().update_totals(&mut tx, id, version, &totals)           │
//! │  db.orders().insert_history(&mut tx, &entry)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  tx.commit()                                                            │
//! │                                                                         │
//! │  Every method takes `&mut SqliteConnection`, so a pooled connection    │
//! │  and an open transaction are interchangeable.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`RegisterRepository`](register::RegisterRepository) - Cash register sessions
//! - [`PaymentRepository`](payment::PaymentRepository) - Payment ledger and installments
//! - [`OrderRepository`](order::OrderRepository) - Order read model and payment history
//! - [`ClientRepository`](client::ClientRepository) - Clients and cached debt

pub mod client;
pub mod order;
pub mod payment;
pub mod register;
