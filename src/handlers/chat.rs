//! Chat endpoint: the request handler / context builder.
//!
//! Implements the per-request decision procedure: resolve and validate the
//! date range, count matching invoices, pick aggregate or detail mode, render
//! the context, assemble the prompt and forward it to the completion
//! provider.

use axum::{extract::State, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::AppError;
use crate::services::context::{
    self, CONCEPT_LIMIT, DETAIL_THRESHOLD, EMPTY_REPLY_NOTICE, SYSTEM_ROLE,
};
use crate::services::metrics::{CHAT_REQUESTS_TOTAL, PROVIDER_DURATION};
use crate::services::providers::GenerationParams;
use crate::startup::AppState;

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Chat request from the UI collaborator.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// Free-text question, passed through verbatim into the prompt.
    pub message: String,
    /// Taxpayer identifier; matched as issuer or receiver, never
    /// format-validated.
    pub rfc: String,
    /// Optional ISO dates; both must be present for an explicit range.
    #[serde(default)]
    pub fecha_inicio: Option<String>,
    #[serde(default)]
    pub fecha_fin: Option<String>,
}

/// Chat response; also the shape of every error payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

// ============================================================================
// Handler
// ============================================================================

/// Answer a question about the RFC's invoices.
///
/// POST /api/chat
#[instrument(skip(state, req), fields(rfc = %req.rfc))]
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let inicio = req.fecha_inicio.as_deref().map(parse_date).transpose()?;
    let fin = req.fecha_fin.as_deref().map(parse_date).transpose()?;

    let range =
        context::resolve_range(inicio, fin, Utc::now().date_naive()).inspect_err(|_| {
            CHAT_REQUESTS_TOTAL
                .with_label_values(&["none", "rejected"])
                .inc();
        })?;

    let total = state.store.count_invoices(&req.rfc, &range).await?;

    // Exactly one of the two modes runs, selected solely by the threshold.
    let (mode, contexto) = if total > DETAIL_THRESHOLD {
        let summaries = state.store.monthly_summary(&req.rfc, &range).await?;
        ("aggregate", context::render_monthly(&summaries))
    } else {
        let invoices = state.store.list_invoices(&req.rfc, &range).await?;
        let concepts = state
            .store
            .list_concepts(&req.rfc, &range, CONCEPT_LIMIT)
            .await?;
        ("detail", context::render_detail(&invoices, &concepts))
    };

    tracing::debug!(
        total_invoices = total,
        mode = mode,
        context_len = contexto.len(),
        "Context assembled"
    );

    let prompt = context::build_prompt(&contexto, &req.message);
    let params = GenerationParams {
        temperature: None,
        max_tokens: Some(state.config.openai.max_output_tokens),
    };

    let timer = PROVIDER_DURATION.with_label_values(&["text"]).start_timer();
    let completion = state
        .text_provider
        .complete(SYSTEM_ROLE, &prompt, &params)
        .await
        .map_err(|e| AppError::BadGateway(e.to_string()))?;
    timer.observe_duration();

    let reply = match completion.text {
        Some(text) if !text.trim().is_empty() => text,
        _ => EMPTY_REPLY_NOTICE.to_string(),
    };

    CHAT_REQUESTS_TOTAL.with_label_values(&[mode, "ok"]).inc();

    Ok(Json(ChatResponse { reply }))
}

/// Unparseable dates take the generic failure path (500), not the
/// validation rejection reserved for over-wide ranges.
fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Unparseable date '{}': {}", s, e)))
}
