use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chart_export::ChartExport;
use chrono::Utc;
use data_normalization::coerce_amount;
use models::Settings;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utils::NewEntry;

use crate::{error::ApiError, repository::RecordRepository, Result};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn RecordRepository>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(repo: Arc<dyn RecordRepository>, settings: Settings) -> Self {
        Self {
            repo,
            settings: Arc::new(settings),
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "expense-api"
    }))
}

/// GET /api/owners/:owner/summary
/// Returns the chart data and forecast for one owner
pub async fn get_summary(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<impl IntoResponse> {
    let records = state.repo.fetch_records(&owner).await?;
    let summary =
        dashboard_engine::summarize(Some(&owner), &records, Utc::now(), &state.settings.forecast);
    Ok(Json(summary))
}

/// POST /api/owners/:owner/charts
/// Regenerates the owner's PNG charts under the configured charts directory
pub async fn export_charts(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> Result<impl IntoResponse> {
    let records = state.repo.fetch_records(&owner).await?;
    let summary =
        dashboard_engine::summarize(Some(&owner), &records, Utc::now(), &state.settings.forecast);
    let output_dir = state.settings.charts_dir.join(utils::owner_directory_name(&owner));

    // plotters writes synchronously
    let report = tokio::task::spawn_blocking(move || {
        ChartExport::new(output_dir).with_summary(&summary).run()
    })
    .await
    .map_err(|e| ApiError::Internal(e.to_string()))??;

    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct SectionRequest {
    pub name: Option<String>,
}

/// POST /api/owners/:owner/sections
pub async fn save_section(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Json(body): Json<SectionRequest>,
) -> Result<impl IntoResponse> {
    let name = body
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("Section name required".to_string()))?;

    let section = state.repo.save_section(&owner, name, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "section": section })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct EntryRequest {
    pub section_id: Option<String>,
    pub title: Option<String>,
    pub amount: Option<Value>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: Option<String>,
}

impl EntryRequest {
    /// Section and title must be present and the amount strictly positive.
    fn into_new_entry(self) -> Option<NewEntry> {
        let section_id = non_blank(self.section_id)?;
        let title = non_blank(self.title)?;
        let amount = coerce_amount(self.amount.as_ref());
        if amount <= 0.0 {
            return None;
        }
        Some(NewEntry {
            section_id,
            title,
            amount,
            kind: non_blank(self.kind),
            category: non_blank(self.category),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /api/owners/:owner/entries
pub async fn save_entry(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    Json(body): Json<EntryRequest>,
) -> Result<impl IntoResponse> {
    let entry = body
        .into_new_entry()
        .ok_or_else(|| ApiError::InvalidInput("Invalid data".to_string()))?;

    let record = state.repo.save_entry(&owner, entry, Utc::now()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "success", "entry": record })),
    ))
}
