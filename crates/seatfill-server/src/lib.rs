//! HTTP surface over [`seatfill::Resolver`].
//!
//! `GET /broadway-data` resolves the current week and
//! `GET /broadway-historical?year=&week=` an explicit one. Any resolved
//! record is a 200; only a bad query is an error.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use seatfill::types::{AttendanceRecord, Period, PeriodError};
use seatfill::{DataSource, Resolver};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid query")]
    BadQuery(#[from] QueryRejection),
    #[error("Invalid week")]
    InvalidWeek(#[from] PeriodError),
}

impl ApiError {
    pub fn envelope(&self) -> serde_json::Value {
        let details = match self {
            ApiError::BadQuery(rejection) => rejection.body_text(),
            ApiError::InvalidWeek(e) => e.to_string(),
        };
        json!({
            "error": self.to_string(),
            "details": details,
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log::warn!("Rejected request: {}", self.envelope());
        (StatusCode::BAD_REQUEST, Json(self.envelope())).into_response()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoricalQuery {
    pub year: Option<i32>,
    pub week: Option<u32>,
}

impl HistoricalQuery {
    /// Missing fields default to the week containing `today`.
    pub fn period(&self, today: NaiveDate) -> Result<Period, PeriodError> {
        let current = Period::containing(today);
        Period::new(
            self.year.unwrap_or(current.year),
            self.week.unwrap_or(current.week),
        )
    }
}

pub async fn broadway_data<S>(State(resolver): State<Resolver<S>>) -> Json<AttendanceRecord>
where
    S: DataSource + Clone + 'static,
{
    let today = Local::now().date_naive();
    Json(resolver.current_week(today).await)
}

pub async fn broadway_historical<S>(
    State(resolver): State<Resolver<S>>,
    query: Result<Query<HistoricalQuery>, QueryRejection>,
) -> Result<Json<AttendanceRecord>, ApiError>
where
    S: DataSource + Clone + 'static,
{
    let Query(query) = query?;
    let today = Local::now().date_naive();
    let period = query.period(today)?;
    log::info!("Historical request for {}", period);

    Ok(Json(resolver.historical_week(period).await))
}

pub fn router<S>(resolver: Resolver<S>) -> Router
where
    S: DataSource + Clone + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/broadway-data", get(broadway_data::<S>))
        .route("/broadway-historical", get(broadway_historical::<S>))
        .layer(cors)
        .with_state(resolver)
}
