//! Sales report endpoints.

use std::sync::Arc;

use ::reports::PeriodReport;
use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use store::SalesStore;

use super::AppState;
use crate::error::ApiError;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// GET /api/report/today: summary of the current business day.
#[tracing::instrument(skip(state))]
pub async fn today<S: SalesStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<PeriodReport>, ApiError> {
    let report = state.reports.today_report(Utc::now()).await?;
    Ok(Json(report))
}

/// GET /api/report: summary over `start_date..=end_date`, both optional.
#[tracing::instrument(skip(state, query))]
pub async fn range<S: SalesStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> Result<Json<PeriodReport>, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let start = parse_date("start_date", query.start_date.as_deref())?;
    let end = parse_date("end_date", query.end_date.as_deref())?;

    let report = state.reports.range_report(start, end, Utc::now()).await?;
    Ok(Json(report))
}

/// Parses an optional `YYYY-MM-DD` parameter. Blank counts as absent.
fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map(Some)
            .map_err(|_| {
                ApiError::BadRequest(format!("{field} must be a YYYY-MM-DD date, got {raw:?}"))
            }),
    }
}
