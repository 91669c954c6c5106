//! PostgreSQL-backed invoice store.

use crate::error::AppError;
use crate::models::{CfdiConcept, CfdiInvoice, MonthlySummary};
use crate::services::context::DateRange;
use crate::services::metrics::DB_QUERY_DURATION;
use crate::services::store::InvoiceStore;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument};

/// Database connection pool wrapper.
///
/// The pool is the only state shared across requests; connections are
/// returned on drop, so every exit path (including the validation early
/// return) releases what it acquired.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "cfdi-chat-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl InvoiceStore for Database {
    #[instrument(skip(self), fields(rfc = %rfc))]
    async fn count_invoices(&self, rfc: &str, range: &DateRange) -> Result<i64, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["count_invoices"])
            .start_timer();

        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM cfdi_invoices
            WHERE fecha BETWEEN $2 AND $3
              AND (rfc_emisor = $1 OR rfc_receptor = $1)
            "#,
        )
        .bind(rfc)
        .bind(range.start)
        .bind(range.end)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to count invoices: {}", e)))?;

        timer.observe_duration();

        Ok(count)
    }

    #[instrument(skip(self), fields(rfc = %rfc))]
    async fn monthly_summary(
        &self,
        rfc: &str,
        range: &DateRange,
    ) -> Result<Vec<MonthlySummary>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["monthly_summary"])
            .start_timer();

        let summaries = sqlx::query_as::<_, MonthlySummary>(
            r#"
            SELECT
                to_char(fecha, 'YYYY-MM') AS mes,
                movimiento,
                COUNT(*) AS num_facturas,
                SUM(subtotal) AS subtotal,
                SUM(total_iva16) AS total_iva16,
                SUM(total_iva8) AS total_iva8,
                SUM(total) AS total
            FROM cfdi_invoices
            WHERE fecha BETWEEN $2 AND $3
              AND (rfc_emisor = $1 OR rfc_receptor = $1)
            GROUP BY to_char(fecha, 'YYYY-MM'), movimiento
            ORDER BY mes DESC, movimiento
            "#,
        )
        .bind(rfc)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to build monthly summary: {}", e))
        })?;

        timer.observe_duration();

        Ok(summaries)
    }

    #[instrument(skip(self), fields(rfc = %rfc))]
    async fn list_invoices(
        &self,
        rfc: &str,
        range: &DateRange,
    ) -> Result<Vec<CfdiInvoice>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_invoices"])
            .start_timer();

        let invoices = sqlx::query_as::<_, CfdiInvoice>(
            r#"
            SELECT uuid, rfc_emisor, rfc_receptor, fecha, subtotal, total_iva16,
                   total_iva8, total, movimiento, moneda, uso_cfdi, tipo_cambio,
                   metodo_pago, tipo_pago
            FROM cfdi_invoices
            WHERE fecha BETWEEN $2 AND $3
              AND (rfc_emisor = $1 OR rfc_receptor = $1)
            ORDER BY fecha DESC
            "#,
        )
        .bind(rfc)
        .bind(range.start)
        .bind(range.end)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list invoices: {}", e)))?;

        timer.observe_duration();

        Ok(invoices)
    }

    #[instrument(skip(self), fields(rfc = %rfc))]
    async fn list_concepts(
        &self,
        rfc: &str,
        range: &DateRange,
        limit: i64,
    ) -> Result<Vec<CfdiConcept>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_concepts"])
            .start_timer();

        let concepts = sqlx::query_as::<_, CfdiConcept>(
            r#"
            SELECT c.uuid, c.clave_producto_servicio, c.descripcion, c.cantidad,
                   c.valor_unitario, c.importe
            FROM cfdi_conceptos c
            INNER JOIN cfdi_invoices f ON c.uuid = f.uuid
            WHERE f.fecha BETWEEN $2 AND $3
              AND f.rfc_receptor = $1
            ORDER BY f.fecha DESC
            LIMIT $4
            "#,
        )
        .bind(rfc)
        .bind(range.start)
        .bind(range.end)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list concepts: {}", e)))?;

        timer.observe_duration();

        Ok(concepts)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }
}
