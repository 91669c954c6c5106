//! Invoice store abstraction.
//!
//! The handler depends on this trait rather than on a concrete pool so the
//! store can be swapped for an in-memory double in tests.

pub mod mock;
pub mod postgres;

use crate::error::AppError;
use crate::models::{CfdiConcept, CfdiInvoice, MonthlySummary};
use crate::services::context::DateRange;
use async_trait::async_trait;

/// Read-only access to CFDI invoices and their line items.
///
/// "Matching" always means the RFC appears as issuer or receiver and the
/// invoice date falls inside the (inclusive) range.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Number of matching invoices.
    async fn count_invoices(&self, rfc: &str, range: &DateRange) -> Result<i64, AppError>;

    /// Per-(month, movement) rollup of matching invoices, months descending.
    async fn monthly_summary(
        &self,
        rfc: &str,
        range: &DateRange,
    ) -> Result<Vec<MonthlySummary>, AppError>;

    /// All matching invoices, newest first.
    async fn list_invoices(&self, rfc: &str, range: &DateRange)
        -> Result<Vec<CfdiInvoice>, AppError>;

    /// Up to `limit` line-item concepts whose parent invoice is in range and
    /// names `rfc` as receiver, newest parent first.
    async fn list_concepts(
        &self,
        rfc: &str,
        range: &DateRange,
        limit: i64,
    ) -> Result<Vec<CfdiConcept>, AppError>;

    /// Liveness probe against the backing store.
    async fn health_check(&self) -> Result<(), AppError>;
}
