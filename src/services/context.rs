//! Query-selection and context-summarization core.
//!
//! Everything user-visible that is not model output lives here: the resolved
//! date range, the one-month width check, the two context renderers
//! (monthly rollup vs. per-invoice detail) and the final prompt. The rendered
//! strings are part of the service contract; the chat UI and the prompt both
//! consume them verbatim, so changes here are behavior changes.

use crate::error::AppError;
use crate::models::{CfdiConcept, CfdiInvoice, MonthlySummary};
use chrono::{Datelike, NaiveDate};

/// Above this many matched invoices the request switches to aggregate mode.
pub const DETAIL_THRESHOLD: i64 = 1000;

/// At most this many line-item concepts are fetched in detail mode.
pub const CONCEPT_LIMIT: i64 = 100;

/// System role handed to the completion provider.
pub const SYSTEM_ROLE: &str = "Eres un experto en contabilidad electrónica.";

/// Validation rejection for ranges wider than (approximately) one month.
pub const RANGE_TOO_WIDE_NOTICE: &str = "⚠️ El rango de fechas no puede ser mayor a un mes.";

/// Embedded in the prompt when the range matched no invoices.
pub const NO_INVOICES_NOTICE: &str =
    "⚠️ No hay facturas para este RFC en el periodo seleccionado.";

/// Substituted when the provider returns an empty or missing completion.
pub const EMPTY_REPLY_NOTICE: &str = "⚠️ El modelo no devolvió respuesta.";

/// Generic failure reply for anything that is not a validation rejection.
pub const ERROR_NOTICE: &str = "⚠️ Error al procesar tu consulta.";

/// Inclusive date range a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Resolve the queried range from optional explicit dates.
///
/// Missing either date falls back to the whole calendar year of `today` and
/// skips the width check. Explicit ranges are capped at roughly one month:
/// month-delta > 1 is rejected, and so is month-delta == 1 when the end
/// day-of-month exceeds the start day-of-month. This is the documented
/// day-of-month comparison, not calendar-exact month arithmetic; a reversed
/// range passes and simply matches nothing.
pub fn resolve_range(
    inicio: Option<NaiveDate>,
    fin: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<DateRange, AppError> {
    let (start, end) = match (inicio, fin) {
        (Some(start), Some(end)) => {
            let month_delta = (end.year() - start.year()) * 12
                + (end.month() as i32 - start.month() as i32);
            if month_delta > 1 || (month_delta == 1 && end.day() > start.day()) {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "{}",
                    RANGE_TOO_WIDE_NOTICE
                )));
            }
            (start, end)
        }
        _ => {
            let year = today.year();
            (
                NaiveDate::from_ymd_opt(year, 1, 1).expect("Jan 1 is always valid"),
                NaiveDate::from_ymd_opt(year, 12, 31).expect("Dec 31 is always valid"),
            )
        }
    };

    Ok(DateRange { start, end })
}

/// Render the monthly rollup: one fixed-format line per (month, movement)
/// group, amounts always carrying exactly two decimal places (whole numbers
/// render as e.g. `9000.00`).
pub fn render_monthly(summaries: &[MonthlySummary]) -> String {
    summaries
        .iter()
        .map(|s| {
            format!(
                "{} ({}) → {} facturas | Subtotal: {:.2} | IVA16: {:.2} | IVA8: {:.2} | Total: {:.2}",
                s.mes, s.movimiento, s.num_facturas, s.subtotal, s.total_iva16, s.total_iva8, s.total
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_invoice(f: &CfdiInvoice) -> String {
    format!(
        "Factura {} ({})\n\
         - Emisor: {}, Receptor: {}\n\
         - Fecha: {}\n\
         - Subtotal: {}, IVA8: {}, IVA16: {}, Total: {}\n\
         - UsoCFDI: {}, Moneda: {}, TipoCambio: {}\n\
         - Método de pago: {}, Tipo de pago: {}",
        f.uuid,
        f.movimiento,
        f.rfc_emisor,
        f.rfc_receptor,
        f.fecha,
        f.subtotal,
        f.total_iva8,
        f.total_iva16,
        f.total,
        f.uso_cfdi,
        f.moneda,
        f.tipo_cambio,
        f.metodo_pago,
        f.tipo_pago
    )
}

fn render_concept(c: &CfdiConcept) -> String {
    format!(
        "Concepto (UUID: {})\n\
         - Producto: {} | {}\n\
         - Cantidad: {}\n\
         - Precio Unitario: {}\n\
         - Importe: {}",
        c.uuid, c.clave_producto_servicio, c.descripcion, c.cantidad, c.valor_unitario, c.importe
    )
}

/// Render the detail context: every invoice as a multi-line block, then the
/// fetched concepts, under two labeled sections.
pub fn render_detail(invoices: &[CfdiInvoice], concepts: &[CfdiConcept]) -> String {
    let facturas = invoices
        .iter()
        .map(render_invoice)
        .collect::<Vec<_>>()
        .join("\n\n");

    let conceptos = concepts
        .iter()
        .map(render_concept)
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "=== FACTURAS ===\n{}\n\n=== PRODUCTOS / CONCEPTOS ===\n{}",
        facturas, conceptos
    )
}

/// Decide whether a rendered detail context is effectively empty.
///
/// Detail mode always emits its section headers; only the content between
/// them counts.
fn context_is_empty(context: &str) -> bool {
    context
        .lines()
        .all(|line| line.trim().is_empty() || line.trim().starts_with("==="))
}

/// Assemble the user-role prompt: fixed advisory instructions, the rendered
/// context (or the no-data notice), and the verbatim user question.
pub fn build_prompt(context: &str, message: &str) -> String {
    let datos = if context_is_empty(context) {
        NO_INVOICES_NOTICE
    } else {
        context
    };

    format!(
        "Eres un asesor financiero experto. Analiza los datos de ingresos, egresos, montos, \
         frecuencia y movimientos para detectar patrones, oportunidades de ahorro, riesgos y \
         áreas de mejora.\n\
         \n\
         Cuando el usuario haga preguntas amplias (como \"¿cómo puedo mejorar mi negocio?\"), \
         utiliza los datos proporcionados para:\n\
         - Identificar tendencias\n\
         - Comparar ingresos vs egresos\n\
         - Sugerir medidas concretas\n\
         - Detectar meses malos o buenos\n\
         - Recomendar acciones estratégicas (reducción de gastos, mejora de clientes, etc.)\n\
         \n\
         Datos disponibles:\n\
         {}\n\
         \n\
         Pregunta del usuario:\n\
         {}",
        datos, message
    )
}
