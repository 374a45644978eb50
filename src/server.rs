use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::post};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{ServerConfig, SolveConfig};
use crate::data::{Schedule, Timetable, TimetableInput};
use crate::error::{ConfigError, DataError, ProjectionError, SolveFailure};
use crate::objectives::ObjectiveKind;
use crate::observe::LogObserver;
use crate::projection;
use crate::solver::{self, Deadline, SolveStatus};

#[derive(Clone)]
pub struct AppState {
    config: Arc<ServerConfig>,
}

/// Request body: the entity collections plus an optional solve config.
#[derive(Debug, Deserialize)]
pub struct SolveRequest {
    #[serde(flatten)]
    pub input: TimetableInput,
    #[serde(default)]
    pub config: Option<SolveConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub status: SolveStatus,
    pub objective: f64,
    pub components: BTreeMap<ObjectiveKind, f64>,
    pub schedule: Schedule,
    pub elapsed_ms: u128,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Solve(#[from] SolveFailure),
    #[error(transparent)]
    Projection(#[from] ProjectionError),
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

#[derive(Serialize)]
struct FailureBody {
    failure: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        match self {
            ApiError::BadRequest(_) => error_response(StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::Data(_) => error_response(StatusCode::BAD_REQUEST, "invalid_data", message),
            ApiError::Config(_) => error_response(StatusCode::BAD_REQUEST, "invalid_config", message),
            ApiError::Solve(failure) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(FailureBody {
                    failure: failure.kind(),
                    message,
                }),
            )
                .into_response(),
            ApiError::Projection(_) => {
                error_response(StatusCode::INTERNAL_SERVER_ERROR, "projection", message)
            }
        }
    }
}

fn error_response(status: StatusCode, error: &'static str, message: String) -> Response {
    (status, Json(ErrorBody { error, message })).into_response()
}

async fn solve_handler(
    State(state): State<AppState>,
    body: Result<Json<SolveRequest>, JsonRejection>,
) -> Result<Json<SolveResponse>, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let config = request.config.unwrap_or_else(|| SolveConfig {
        timeout_secs: state.config.default_timeout_secs,
        ..SolveConfig::default()
    });
    config.validate()?;
    let timetable = Arc::new(Timetable::try_from(request.input)?);

    let deadline = Deadline::after(config.timeout());
    let budget = config
        .timeout()
        .saturating_add(Duration::from_secs(state.config.solve_grace_secs));
    let worker_timetable = Arc::clone(&timetable);
    let task = tokio::task::spawn_blocking(move || {
        solver::solve_until(&worker_timetable, &config, deadline, &LogObserver)
    });

    let solved = match tokio::time::timeout(budget, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(join_error)) => {
            return Err(SolveFailure::Error(format!("solver task failed: {join_error}")).into());
        }
        Err(_) => {
            // HiGHS cannot be cancelled; the thread runs until its own time limit.
            warn!(
                "Solver exceeded {:?}; abandoning worker thread",
                budget
            );
            return Err(SolveFailure::Timeout.into());
        }
    };

    let schedule = projection::project(&timetable, &solved.assignments)?;
    Ok(Json(SolveResponse {
        status: solved.status,
        objective: solved.objective,
        components: solved.components,
        schedule,
        elapsed_ms: solved.elapsed.as_millis(),
    }))
}

pub fn router(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    Router::new()
        .route("/v1/timetable/solve", post(solve_handler))
        .with_state(state)
}

pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = config.bind_addr;
    let app = router(config);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_accepts_missing_config() {
        let body = r#"{
            "teachers": [{"id": "T1", "name": "Ada", "availability": [[true, true]]}],
            "classes": [{"id": "C1", "subject": "Maths", "gradeLevel": 9, "numStudents": 20, "periodsPerWeek": 1}],
            "rooms": [{"id": "R1", "capacity": 30}],
            "timeSlots": [{"day": 0, "period": 0}, {"day": 0, "period": 1}]
        }"#;
        let request: SolveRequest = serde_json::from_str(body).unwrap();
        assert!(request.config.is_none());
        assert_eq!(request.input.time_slots.len(), 2);
        assert_eq!(request.input.rooms[0].room_type, "");
    }

    #[test]
    fn test_request_config_weights() {
        let body = r#"{
            "teachers": [], "classes": [], "rooms": [], "timeSlots": [],
            "config": {"weights": {"gaps": 2.0, "workload": 0.5}, "timeoutSecs": 10}
        }"#;
        let request: SolveRequest = serde_json::from_str(body).unwrap();
        let config = request.config.unwrap();
        assert_eq!(config.weights.gaps, Some(2.0));
        assert_eq!(config.weights.workload, Some(0.5));
        assert_eq!(config.weights.distribution, None);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_error_status_codes() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Config(ConfigError::ZeroTimeout), StatusCode::BAD_REQUEST),
            (
                ApiError::Solve(SolveFailure::Infeasible),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::Projection(ProjectionError::NotSolved),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (error, status) in cases {
            assert_eq!(error.into_response().status(), status);
        }
    }
}
