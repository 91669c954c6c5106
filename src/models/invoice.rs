//! CFDI invoice and line-item concept rows.
//!
//! Both tables are owned by the ingestion pipeline; this service only reads
//! them, so there are no create/update inputs here.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A stamped CFDI as stored in `cfdi_invoices`.
///
/// `movimiento` is "Ingreso" or "Egreso" relative to the RFC that owns the
/// row; the same flag shows up verbatim in rendered context.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CfdiInvoice {
    pub uuid: Uuid,
    pub rfc_emisor: String,
    pub rfc_receptor: String,
    pub fecha: NaiveDate,
    pub subtotal: Decimal,
    pub total_iva16: Decimal,
    pub total_iva8: Decimal,
    pub total: Decimal,
    pub movimiento: String,
    pub moneda: String,
    pub uso_cfdi: String,
    pub tipo_cambio: Decimal,
    pub metodo_pago: String,
    pub tipo_pago: String,
}

/// A line item from `cfdi_conceptos`, keyed by its parent invoice UUID.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CfdiConcept {
    pub uuid: Uuid,
    pub clave_producto_servicio: String,
    pub descripcion: String,
    pub cantidad: Decimal,
    pub valor_unitario: Decimal,
    pub importe: Decimal,
}
