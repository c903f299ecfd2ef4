mod common;

use common::{debt_payment, reais, sale_for_order, setup};
use lente_core::{Money, PaymentDetails};

#[tokio::test]
async fn test_recalculation_is_idempotent() {
    let t = setup().await;
    t.add_client("c1").await;
    t.add_client("c2").await;
    t.add_order("o1", "c1", reais(300), 3).await;
    t.add_order("o2", "c2", reais(90), 2).await;
    t.ledger.registers.open(Money::zero(), None, "ana").await.unwrap();

    t.ledger
        .payments
        .create(sale_for_order(reais(100), PaymentDetails::Credit, "o1"))
        .await
        .unwrap();

    let first = t.ledger.payments.recalculate_client_debts(None).await.unwrap();
    let second = t.ledger.payments.recalculate_client_debts(None).await.unwrap();
    assert_eq!(first, second);

    let by_client: Vec<(String, Money)> = first
        .into_iter()
        .map(|u| (u.client_id, u.total_debt))
        .collect();
    assert_eq!(
        by_client,
        vec![("c1".to_string(), reais(200)), ("c2".to_string(), reais(90))]
    );
}

#[tokio::test]
async fn test_debt_never_negative() {
    let t = setup().await;
    t.add_client("c1").await;
    t.add_order("o1", "c1", reais(50), 0).await;
    t.ledger.registers.open(Money::zero(), None, "ana").await.unwrap();

    // Over-payment against the order itself is accepted; debt floors at zero.
    t.ledger
        .payments
        .create(sale_for_order(reais(70), PaymentDetails::Cash, "o1"))
        .await
        .unwrap();

    let report = t.ledger.debts.compute_debt("c1").await.unwrap();
    assert_eq!(report.total_debt, Money::zero());
    assert!(report.orders.is_empty());
    assert_eq!(report.payment_history.len(), 1);
    assert_eq!(t.client("c1").await.total_debt, Money::zero());

    let only = t.ledger.payments.recalculate_client_debts(Some("c1")).await.unwrap();
    assert_eq!(only.len(), 1);
    assert_eq!(only[0].total_debt, Money::zero());
}

#[tokio::test]
async fn test_debt_payment_by_legacy_client_reduces_debt() {
    let t = setup().await;
    t.add_client("c1").await;
    t.add_order("o1", "c1", reais(120), 5).await;
    t.ledger.registers.open(Money::zero(), None, "ana").await.unwrap();
    t.ledger.payments.recalculate_client_debts(Some("c1")).await.unwrap();
    assert_eq!(t.client("c1").await.total_debt, reais(120));

    let mut input = debt_payment(reais(20), PaymentDetails::Pix, "c1");
    input.legacy_client_id = input.customer_id.take();
    t.ledger.payments.create(input).await.unwrap();

    assert_eq!(t.client("c1").await.total_debt, reais(100));
}
