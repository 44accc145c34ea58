use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::{
    AggregateReport, CreateSymptomRequest, DashboardSummary, SummaryResponse, SymptomEntry,
};
use crate::report::render_markdown;
use crate::state::AppState;
use crate::stats::{compute_dashboard, compute_report_with};
use crate::storage::persist_data;
use crate::summary::{build_prompt, SummaryError, SUMMARY_ENTRY_LIMIT};
use crate::weather::lookup_or_default;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{FixedOffset, Offset, Utc};
use tracing::{error, info};
use uuid::Uuid;

pub async fn health() -> &'static str {
    "ok"
}

pub async fn create_symptom(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CreateSymptomRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SymptomEntry>), AppError> {
    let Json(payload) = payload?;
    let label = payload
        .symptom_type
        .as_deref()
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .ok_or_else(|| AppError::bad_request("Missing required fields"))?
        .to_string();
    let (Some(severity), Some(latitude), Some(longitude)) =
        (payload.severity, payload.latitude, payload.longitude)
    else {
        return Err(AppError::bad_request("Missing required fields"));
    };
    let severity = u8::try_from(severity)
        .ok()
        .filter(|value| (1..=10).contains(value))
        .ok_or_else(|| AppError::bad_request("severity must be between 1 and 10"))?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(AppError::bad_request("coordinates out of range"));
    }

    // outside the store lock; a failed lookup leaves the weather fields empty
    let weather = lookup_or_default(state.weather.as_ref(), latitude, longitude).await;
    let offset = payload
        .utc_offset_minutes
        .and_then(|minutes| FixedOffset::east_opt(minutes.saturating_mul(60)))
        .or_else(|| weather.utc_offset_seconds.and_then(FixedOffset::east_opt))
        .unwrap_or_else(|| Utc.fix());

    let entry = SymptomEntry {
        id: Uuid::new_v4(),
        occurred_at: Utc::now().with_timezone(&offset),
        symptom_label: label,
        severity,
        notes: payload
            .notes
            .map(|notes| notes.trim().to_string())
            .filter(|notes| !notes.is_empty()),
        temperature_c: weather.temperature_c,
        humidity_pct: weather.humidity_pct,
        weather_code: weather.weather_code,
    };

    let mut data = state.data.lock().await;
    data.insert_entry(&user_id, entry.clone());
    if let Err(err) = persist_data(&state.data_path, &data).await {
        // not saved, so it must not be served either
        data.remove_entry(&user_id, entry.id);
        error!(user = %user_id, "failed to save symptom log: {}", err.message);
        return Err(err);
    }

    info!(
        user = %user_id,
        symptom = %entry.symptom_label,
        severity = entry.severity,
        has_weather = entry.temperature_c.is_some(),
        "symptom logged"
    );
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn list_symptoms(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<SymptomEntry>>, AppError> {
    let data = state.data.lock().await;
    let newest_first = data.entries_for(&user_id).iter().rev().cloned().collect();
    Ok(Json(newest_first))
}

pub async fn get_dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardSummary>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(compute_dashboard(data.entries_for(&user_id))))
}

pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<AggregateReport>, AppError> {
    Ok(Json(user_report(&state, &user_id).await?))
}

pub async fn get_stats_markdown(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let report = user_report(&state, &user_id).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        render_markdown(&report),
    ))
}

pub async fn get_ai_summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SummaryResponse>, AppError> {
    let summarizer = state
        .summarizer
        .clone()
        .ok_or(SummaryError::NotConfigured)?;

    let prompt = {
        let data = state.data.lock().await;
        let newest: Vec<SymptomEntry> = data
            .entries_for(&user_id)
            .iter()
            .rev()
            .take(SUMMARY_ENTRY_LIMIT)
            .cloned()
            .collect();
        if newest.is_empty() {
            return Err(AppError::no_data());
        }
        build_prompt(&newest)
    };

    let summary = summarizer.summarize(&prompt).await?;
    Ok(Json(SummaryResponse { summary }))
}

async fn user_report(state: &AppState, user_id: &str) -> Result<AggregateReport, AppError> {
    let data = state.data.lock().await;
    let entries = data.entries_for(user_id);
    if entries.is_empty() {
        return Err(AppError::no_data());
    }
    Ok(compute_report_with(entries, Utc::now(), &state.correlation))
}
