//! In-memory store double for tests.

use crate::error::AppError;
use crate::models::{CfdiConcept, CfdiInvoice, MonthlySummary};
use crate::services::context::DateRange;
use crate::services::store::InvoiceStore;
use async_trait::async_trait;

/// Mock invoice store backed by plain vectors.
///
/// Counting and the detail listing apply the real matching rules (RFC as
/// issuer or receiver, date within range). `forced_count` overrides the
/// count so aggregate mode can be exercised without thousands of rows.
#[derive(Default)]
pub struct MockInvoiceStore {
    invoices: Vec<CfdiInvoice>,
    concepts: Vec<CfdiConcept>,
    summaries: Vec<MonthlySummary>,
    forced_count: Option<i64>,
    healthy: bool,
}

impl MockInvoiceStore {
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Self::default()
        }
    }

    pub fn with_invoices(mut self, invoices: Vec<CfdiInvoice>) -> Self {
        self.invoices = invoices;
        self
    }

    pub fn with_concepts(mut self, concepts: Vec<CfdiConcept>) -> Self {
        self.concepts = concepts;
        self
    }

    pub fn with_summaries(mut self, summaries: Vec<MonthlySummary>) -> Self {
        self.summaries = summaries;
        self
    }

    pub fn with_forced_count(mut self, count: i64) -> Self {
        self.forced_count = Some(count);
        self
    }

    pub fn unhealthy() -> Self {
        Self::default()
    }

    fn matches(invoice: &CfdiInvoice, rfc: &str, range: &DateRange) -> bool {
        (invoice.rfc_emisor == rfc || invoice.rfc_receptor == rfc)
            && invoice.fecha >= range.start
            && invoice.fecha <= range.end
    }
}

#[async_trait]
impl InvoiceStore for MockInvoiceStore {
    async fn count_invoices(&self, rfc: &str, range: &DateRange) -> Result<i64, AppError> {
        if let Some(count) = self.forced_count {
            return Ok(count);
        }
        Ok(self
            .invoices
            .iter()
            .filter(|f| Self::matches(f, rfc, range))
            .count() as i64)
    }

    async fn monthly_summary(
        &self,
        _rfc: &str,
        _range: &DateRange,
    ) -> Result<Vec<MonthlySummary>, AppError> {
        Ok(self.summaries.clone())
    }

    async fn list_invoices(
        &self,
        rfc: &str,
        range: &DateRange,
    ) -> Result<Vec<CfdiInvoice>, AppError> {
        let mut matched: Vec<CfdiInvoice> = self
            .invoices
            .iter()
            .filter(|f| Self::matches(f, rfc, range))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.fecha.cmp(&a.fecha));
        Ok(matched)
    }

    async fn list_concepts(
        &self,
        _rfc: &str,
        _range: &DateRange,
        limit: i64,
    ) -> Result<Vec<CfdiConcept>, AppError> {
        Ok(self.concepts.iter().take(limit as usize).cloned().collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        if self.healthy {
            Ok(())
        } else {
            Err(AppError::DatabaseError(anyhow::anyhow!(
                "Mock store marked unhealthy"
            )))
        }
    }
}
