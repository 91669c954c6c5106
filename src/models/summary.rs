//! Derived monthly rollup used in aggregate mode.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One (year-month, movement) group. Computed per request by the store,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MonthlySummary {
    /// Year-month in `YYYY-MM` form.
    pub mes: String,
    pub movimiento: String,
    pub num_facturas: i64,
    pub subtotal: Decimal,
    pub total_iva16: Decimal,
    pub total_iva8: Decimal,
    pub total: Decimal,
}
