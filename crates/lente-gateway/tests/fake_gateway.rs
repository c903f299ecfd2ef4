//! Boleto client against an in-process fake bank API.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Form, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use lente_core::Money;
use lente_gateway::error::{
    AUTH_FAILED, DECODE_ERROR, INVALID_REQUEST, NOT_FOUND, REJECTED, TIMEOUT, UNAUTHORIZED,
};
use lente_gateway::{
    BoletoClient, BoletoRequest, BoletoStatus, CancelReason, GatewayConfig, Payer,
};

// =============================================================================
// Fake Bank
// =============================================================================

#[derive(Default)]
struct FakeBank {
    token_calls: AtomicUsize,
    /// Number of upcoming boleto calls answered with 401.
    force_401: AtomicUsize,
    slow: AtomicBool,
    next_number: AtomicUsize,
    boletos: Mutex<HashMap<String, Value>>,
    last_body: Mutex<Option<Value>>,
}

type Shared = Arc<FakeBank>;

async fn token(State(bank): State<Shared>, Form(form): Form<HashMap<String, String>>) -> Response {
    if form.get("grant_type").map(String::as_str) != Some("client_credentials")
        || form.get("client_secret").map(String::as_str) != Some("secret")
    {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"}))).into_response();
    }
    let n = bank.token_calls.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({
        "access_token": format!("tok-{n}"),
        "expires_in": 3600,
        "token_type": "Bearer",
    }))
    .into_response()
}

fn reject(bank: &FakeBank, headers: &HeaderMap) -> Option<Response> {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |v| v.starts_with("Bearer "));
    let client_id = headers.contains_key("client_id");
    if !bearer || !client_id {
        return Some(StatusCode::UNAUTHORIZED.into_response());
    }
    let pending = bank.force_401.load(Ordering::SeqCst);
    if pending > 0 {
        bank.force_401.store(pending - 1, Ordering::SeqCst);
        return Some(StatusCode::UNAUTHORIZED.into_response());
    }
    None
}

async fn create(State(bank): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Some(resp) = reject(&bank, &headers) {
        return resp;
    }
    if bank.slow.load(Ordering::SeqCst) {
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    if body["boleto"]["valor"].as_f64().unwrap_or_default() > 50_000.0 {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"mensagens": [{"codigo": "4001", "mensagem": "Valor acima do limite"}]})),
        )
            .into_response();
    }

    let nn = format!("{:010}", bank.next_number.fetch_add(1, Ordering::SeqCst) + 1);
    bank.boletos
        .lock()
        .unwrap()
        .insert(nn.clone(), json!({"nossoNumero": nn, "situacao": "REGISTERED"}));
    *bank.last_body.lock().unwrap() = Some(body);

    Json(json!({
        "nossoNumero": nn,
        "codigoBarras": "75691306900000150501306901123456000000000101",
        "linhaDigitavel": "75691.30698 01123.456000 00000.001018 1 30690000015050",
        "pdfUrl": format!("https://bank.example/pdf/{nn}"),
    }))
    .into_response()
}

async fn status(State(bank): State<Shared>, headers: HeaderMap, Path(nn): Path<String>) -> Response {
    if let Some(resp) = reject(&bank, &headers) {
        return resp;
    }
    match bank.boletos.lock().unwrap().get(&nn) {
        Some(b) => Json(b.clone()).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"mensagem": "não encontrado"}))).into_response(),
    }
}

async fn cancel(
    State(bank): State<Shared>,
    headers: HeaderMap,
    Path(nn): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(resp) = reject(&bank, &headers) {
        return resp;
    }
    let mut boletos = bank.boletos.lock().unwrap();
    match boletos.get_mut(&nn) {
        Some(b) => {
            b["situacao"] = json!("CANCELLED");
            b["motivo"] = body["motivo"].clone();
            StatusCode::NO_CONTENT.into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_bank() -> (Shared, String) {
    let bank: Shared = Arc::new(FakeBank::default());
    let app = Router::new()
        .route("/oauth/token", post(token))
        .route("/boletos", post(create))
        .route("/boletos/{nn}", get(status))
        .route("/boletos/{nn}/cancelar", post(cancel))
        .with_state(bank.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (bank, format!("http://{addr}"))
}

fn config(base: &str, secret: &str) -> GatewayConfig {
    GatewayConfig::from_toml_str(&format!(
        r#"
        base_url = "{base}"
        auth_url = "{base}/oauth/token"
        client_id = "lente"
        client_secret = "{secret}"
        cooperative_code = "3069"
        post_code = "01"
        beneficiary_code = "123456"
        timeout_secs = 1
        "#
    ))
    .unwrap()
}

fn request() -> BoletoRequest {
    BoletoRequest {
        amount: Money::from_cents(15_050),
        due_date: NaiveDate::from_ymd_opt(2026, 11, 17).unwrap(),
        your_number: "PAY-0001".to_string(),
        payer: Payer {
            document: "12345678909".to_string(),
            name: "Rita Lima".to_string(),
            address: None,
            city: None,
            state: None,
            zip_code: None,
            email: None,
        },
        instructions: vec!["Não receber após o vencimento".to_string()],
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_boleto_lifecycle() {
    let (bank, base) = spawn_bank().await;
    let client = BoletoClient::new(config(&base, "secret")).unwrap();

    let boleto = client.generate_boleto(&request()).await.unwrap();
    assert_eq!(boleto.nosso_numero, "0000000001");
    assert!(boleto.pdf_url.is_some());

    let body = bank.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["codigoBeneficiario"], "123456");
    assert_eq!(body["boleto"]["valor"], 150.5);

    let report = client.get_boleto_status(&boleto.nosso_numero).await.unwrap();
    assert_eq!(report.status, BoletoStatus::Registered);
    assert_eq!(report.paid_amount, None);

    bank.boletos.lock().unwrap().insert(
        boleto.nosso_numero.clone(),
        json!({
            "nossoNumero": boleto.nosso_numero,
            "situacao": "PAID",
            "valorPago": 150.5,
            "dataPagamento": "2026-11-10",
        }),
    );
    let report = client.get_boleto_status(&boleto.nosso_numero).await.unwrap();
    assert_eq!(report.status, BoletoStatus::Paid);
    assert_eq!(report.paid_amount, Some(Money::from_cents(15_050)));
    assert_eq!(report.paid_at, NaiveDate::from_ymd_opt(2026, 11, 10));

    // One token exchange served every call
    assert_eq!(bank.token_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_401_reauthenticates_once() {
    let (bank, base) = spawn_bank().await;
    let client = BoletoClient::new(config(&base, "secret")).unwrap();

    let boleto = client.generate_boleto(&request()).await.unwrap();
    assert_eq!(bank.token_calls.load(Ordering::SeqCst), 1);

    bank.force_401.store(1, Ordering::SeqCst);
    client.get_boleto_status(&boleto.nosso_numero).await.unwrap();
    assert_eq!(bank.token_calls.load(Ordering::SeqCst), 2);

    // Two consecutive 401s are surfaced, not retried forever
    bank.force_401.store(2, Ordering::SeqCst);
    let err = client.get_boleto_status(&boleto.nosso_numero).await.unwrap_err();
    assert_eq!(err.code, UNAUTHORIZED);
    assert_eq!(bank.token_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_bad_credentials() {
    let (_bank, base) = spawn_bank().await;
    let client = BoletoClient::new(config(&base, "wrong")).unwrap();

    let err = client.authenticate().await.unwrap_err();
    assert_eq!(err.code, AUTH_FAILED);
    assert!(!client.test_connection().await);
}

#[tokio::test]
async fn test_static_token_skips_exchange() {
    let (bank, base) = spawn_bank().await;
    let mut cfg = config(&base, "secret");
    cfg.access_token = Some("static-token".to_string());
    let client = BoletoClient::new(cfg).unwrap();

    assert!(client.test_connection().await);
    client.generate_boleto(&request()).await.unwrap();
    assert_eq!(bank.token_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_request_never_reaches_the_bank() {
    let (bank, base) = spawn_bank().await;
    let client = BoletoClient::new(config(&base, "secret")).unwrap();

    let mut req = request();
    req.payer.name = " ".to_string();
    let err = client.generate_boleto(&req).await.unwrap_err();
    assert_eq!(err.code, INVALID_REQUEST);
    assert!(bank.last_body.lock().unwrap().is_none());

    let err = client.get_boleto_status("../admin").await.unwrap_err();
    assert_eq!(err.code, INVALID_REQUEST);
}

#[tokio::test]
async fn test_bank_errors_carry_details() {
    let (bank, base) = spawn_bank().await;
    let client = BoletoClient::new(config(&base, "secret")).unwrap();

    let mut req = request();
    req.amount = Money::from_cents(10_000_000);
    let err = client.generate_boleto(&req).await.unwrap_err();
    assert_eq!(err.code, REJECTED);
    let details = err.details.unwrap();
    assert_eq!(details["status"], 422);
    assert_eq!(details["body"]["mensagens"][0]["codigo"], "4001");

    let err = client.get_boleto_status("9999999999").await.unwrap_err();
    assert_eq!(err.code, NOT_FOUND);

    let boleto = client.generate_boleto(&request()).await.unwrap();
    bank.boletos.lock().unwrap().insert(
        boleto.nosso_numero.clone(),
        json!({"nossoNumero": boleto.nosso_numero, "situacao": "LOST"}),
    );
    let err = client.get_boleto_status(&boleto.nosso_numero).await.unwrap_err();
    assert_eq!(err.code, DECODE_ERROR);
}

#[tokio::test]
async fn test_cancel_boleto() {
    let (bank, base) = spawn_bank().await;
    let client = BoletoClient::new(config(&base, "secret")).unwrap();

    let boleto = client.generate_boleto(&request()).await.unwrap();
    client
        .cancel_boleto(&boleto.nosso_numero, CancelReason::IssuedInError)
        .await
        .unwrap();

    let stored = bank.boletos.lock().unwrap().get(&boleto.nosso_numero).cloned().unwrap();
    assert_eq!(stored["motivo"], "ISSUED_IN_ERROR");

    let report = client.get_boleto_status(&boleto.nosso_numero).await.unwrap();
    assert_eq!(report.status, BoletoStatus::Cancelled);
}

#[tokio::test]
async fn test_timeout_is_reported_as_unknown_outcome() {
    let (bank, base) = spawn_bank().await;
    let client = BoletoClient::new(config(&base, "secret")).unwrap();
    client.authenticate().await.unwrap();

    bank.slow.store(true, Ordering::SeqCst);
    let err = client.generate_boleto(&request()).await.unwrap_err();
    assert_eq!(err.code, TIMEOUT);
    assert!(err.is_timeout());
}
