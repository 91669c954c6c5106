//! Chat endpoint integration tests.

mod common;

use common::{TestApp, TEST_RFC};

use cfdi_chat_service::models::{CfdiConcept, CfdiInvoice, MonthlySummary};
use cfdi_chat_service::services::context::{
    EMPTY_REPLY_NOTICE, ERROR_NOTICE, NO_INVOICES_NOTICE, RANGE_TOO_WIDE_NOTICE,
};
use cfdi_chat_service::services::providers::mock::MockTextProvider;
use cfdi_chat_service::services::store::mock::MockInvoiceStore;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

fn invoice(fecha: &str, movimiento: &str) -> CfdiInvoice {
    CfdiInvoice {
        uuid: Uuid::new_v4(),
        rfc_emisor: TEST_RFC.to_string(),
        rfc_receptor: "XAXX010101000".to_string(),
        fecha: NaiveDate::from_str(fecha).unwrap(),
        subtotal: Decimal::from_str("100.00").unwrap(),
        total_iva16: Decimal::from_str("16.00").unwrap(),
        total_iva8: Decimal::ZERO,
        total: Decimal::from_str("116.00").unwrap(),
        movimiento: movimiento.to_string(),
        moneda: "MXN".to_string(),
        uso_cfdi: "G03".to_string(),
        tipo_cambio: Decimal::ONE,
        metodo_pago: "PUE".to_string(),
        tipo_pago: "03".to_string(),
    }
}

fn concept(uuid: Uuid, descripcion: &str) -> CfdiConcept {
    CfdiConcept {
        uuid,
        clave_producto_servicio: "43231512".to_string(),
        descripcion: descripcion.to_string(),
        cantidad: Decimal::from_str("2").unwrap(),
        valor_unitario: Decimal::from_str("50.00").unwrap(),
        importe: Decimal::from_str("100.00").unwrap(),
    }
}

fn summary(mes: &str, movimiento: &str, num_facturas: i64) -> MonthlySummary {
    MonthlySummary {
        mes: mes.to_string(),
        movimiento: movimiento.to_string(),
        num_facturas,
        subtotal: Decimal::from_str("50000.00").unwrap(),
        total_iva16: Decimal::from_str("8000.00").unwrap(),
        total_iva8: Decimal::ZERO,
        total: Decimal::from_str("58000.00").unwrap(),
    }
}

async fn reply_of(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("Body was not JSON");
    body["reply"].as_str().expect("Missing reply field").to_string()
}

#[tokio::test]
async fn range_wider_than_one_month_is_rejected_with_400() {
    let app = TestApp::spawn().await;

    let response = app
        .post_chat(&json!({
            "message": "¿Cuánto facturé?",
            "rfc": TEST_RFC,
            "fechaInicio": "2024-01-01",
            "fechaFin": "2024-03-01"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(reply_of(response).await, RANGE_TOO_WIDE_NOTICE);
}

#[tokio::test]
async fn one_month_range_with_earlier_end_day_is_accepted() {
    let app = TestApp::spawn().await;

    let response = app
        .post_chat(&json!({
            "message": "¿Cuánto facturé?",
            "rfc": TEST_RFC,
            "fechaInicio": "2024-01-20",
            "fechaFin": "2024-02-10"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
}

#[tokio::test]
async fn empty_store_embeds_no_invoices_notice_in_prompt() {
    // The echoing mock provider surfaces the assembled prompt as the reply.
    let app = TestApp::spawn().await;

    let response = app
        .post_chat(&json!({
            "message": "¿Cómo va mi negocio?",
            "rfc": TEST_RFC
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let reply = reply_of(response).await;
    assert!(reply.contains(NO_INVOICES_NOTICE));
    assert!(reply.contains("¿Cómo va mi negocio?"));
}

#[tokio::test]
async fn detail_mode_renders_invoice_and_concept_blocks() {
    let first = invoice("2024-02-10", "Ingreso");
    let first_uuid = first.uuid;
    let store = MockInvoiceStore::new()
        .with_invoices(vec![first, invoice("2024-02-05", "Egreso")])
        .with_concepts(vec![concept(first_uuid, "Licencia de software")]);

    let app = TestApp::spawn_with(Arc::new(store), Arc::new(MockTextProvider::new(true))).await;

    let response = app
        .post_chat(&json!({
            "message": "Detalle por favor",
            "rfc": TEST_RFC,
            "fechaInicio": "2024-02-01",
            "fechaFin": "2024-02-28"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let reply = reply_of(response).await;
    assert!(reply.contains(&format!("Factura {} (Ingreso)", first_uuid)));
    assert!(reply.contains("=== PRODUCTOS / CONCEPTOS ==="));
    assert!(reply.contains("Licencia de software"));
    assert!(!reply.contains(NO_INVOICES_NOTICE));
}

#[tokio::test]
async fn aggregate_mode_runs_when_count_exceeds_threshold() {
    let store = MockInvoiceStore::new()
        .with_forced_count(1500)
        .with_summaries(vec![
            summary("2024-02", "Egreso", 700),
            summary("2024-02", "Ingreso", 800),
        ]);

    let app = TestApp::spawn_with(Arc::new(store), Arc::new(MockTextProvider::new(true))).await;

    let response = app
        .post_chat(&json!({
            "message": "Resumen mensual",
            "rfc": TEST_RFC,
            "fechaInicio": "2024-02-01",
            "fechaFin": "2024-02-28"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let reply = reply_of(response).await;
    assert!(reply.contains("2024-02 (Ingreso) → 800 facturas"));
    assert!(reply.contains("2024-02 (Egreso) → 700 facturas"));
    assert!(reply.contains("Subtotal: 50000.00 | IVA16: 8000.00 | IVA8: 0.00 | Total: 58000.00"));
    assert!(!reply.contains("=== FACTURAS ==="));
}

#[tokio::test]
async fn detail_mode_caps_concept_blocks_at_one_hundred() {
    let inv = invoice("2024-02-10", "Ingreso");
    let inv_uuid = inv.uuid;
    let concepts: Vec<CfdiConcept> = (0..150)
        .map(|i| concept(inv_uuid, &format!("Servicio {}", i)))
        .collect();
    let store = MockInvoiceStore::new()
        .with_invoices(vec![inv])
        .with_concepts(concepts);

    let app = TestApp::spawn_with(Arc::new(store), Arc::new(MockTextProvider::new(true))).await;

    let response = app
        .post_chat(&json!({
            "message": "Detalle por favor",
            "rfc": TEST_RFC,
            "fechaInicio": "2024-02-01",
            "fechaFin": "2024-02-28"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    let reply = reply_of(response).await;
    assert_eq!(reply.matches("Concepto (UUID:").count(), 100);
    assert!(reply.contains("Servicio 99"));
    assert!(!reply.contains("Servicio 100"));
}

#[tokio::test]
async fn count_at_threshold_stays_in_detail_mode() {
    // 1000 is not "more than 1000"; the rollup must not run.
    let store = MockInvoiceStore::new()
        .with_forced_count(1000)
        .with_invoices(vec![invoice("2024-02-10", "Ingreso")])
        .with_summaries(vec![summary("2024-02", "Ingreso", 1000)]);

    let app = TestApp::spawn_with(Arc::new(store), Arc::new(MockTextProvider::new(true))).await;

    let response = app
        .post_chat(&json!({
            "message": "¿Qué modo?",
            "rfc": TEST_RFC,
            "fechaInicio": "2024-02-01",
            "fechaFin": "2024-02-28"
        }))
        .await;

    let reply = reply_of(response).await;
    assert!(reply.contains("=== FACTURAS ==="));
    assert!(!reply.contains("→ 1000 facturas"));
}

#[tokio::test]
async fn empty_model_reply_is_replaced_with_fallback_notice() {
    let app = TestApp::spawn_with(
        Arc::new(MockInvoiceStore::new()),
        Arc::new(MockTextProvider::with_reply("   ")),
    )
    .await;

    let response = app
        .post_chat(&json!({
            "message": "hola",
            "rfc": TEST_RFC
        }))
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(reply_of(response).await, EMPTY_REPLY_NOTICE);
}

#[tokio::test]
async fn provider_failure_returns_generic_notice_with_500() {
    let app = TestApp::spawn_with(
        Arc::new(MockInvoiceStore::new()),
        Arc::new(MockTextProvider::new(false)),
    )
    .await;

    let response = app
        .post_chat(&json!({
            "message": "hola",
            "rfc": TEST_RFC
        }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(reply_of(response).await, ERROR_NOTICE);
}

#[tokio::test]
async fn malformed_date_returns_generic_notice_with_500() {
    let app = TestApp::spawn().await;

    let response = app
        .post_chat(&json!({
            "message": "hola",
            "rfc": TEST_RFC,
            "fechaInicio": "not-a-date",
            "fechaFin": "2024-02-10"
        }))
        .await;

    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(reply_of(response).await, ERROR_NOTICE);
}
