pub mod invoice;
pub mod summary;

pub use invoice::{CfdiConcept, CfdiInvoice};
pub use summary::MonthlySummary;
