use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::collector::Collector;
use crate::models::financial_year::FinancialYear;
use crate::models::task::Task;
use crate::state::AppState;
use crate::stats::{summarize, SummaryStats};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/financial-years", get(list_financial_years))
}

#[derive(Deserialize)]
pub struct StatsQuery {
    pub financial_year: Option<String>,
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<SummaryStats>, AppError> {
    let financial_year = match query.financial_year {
        Some(id) => state
            .financial_years
            .iter()
            .find(|fy| fy.id == id)
            .map(|fy| fy.id.clone())
            .ok_or_else(|| AppError::BadRequest(format!("unknown financial year {id}")))?,
        None => state
            .financial_years
            .first()
            .map(|fy| fy.id.clone())
            .ok_or_else(|| AppError::Internal("no financial years configured".to_string()))?,
    };

    let collectors: Vec<Collector> = state
        .collectors
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    let tasks: Vec<Task> = state
        .tasks
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    Ok(Json(summarize(&collectors, &tasks, &financial_year)))
}

async fn list_financial_years(State(state): State<Arc<AppState>>) -> Json<Vec<FinancialYear>> {
    Json(state.financial_years.clone())
}
