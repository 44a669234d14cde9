use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};

use crate::application::agile::{AgileQuery, AgileQueryError, AgileQueryParams};
use crate::application::error::ErrorReport;
use crate::infra::http::api::state::ApiState;

/// `GET /api/v1/teams/agile`.
///
/// Bodies are the bare result (array, object or `null`). Failures answer with
/// `{ "error": message }`, except an unreadable member list which answers `[]`.
pub async fn agile_query(
    State(state): State<ApiState>,
    Query(params): Query<AgileQueryParams>,
) -> Response {
    let query = match AgileQuery::decode(&params) {
        Ok(query) => query,
        Err(err) => return agile_error_response(err),
    };

    match state.agile.execute(query).await {
        Ok(body) => Json(body).into_response(),
        Err(err) => agile_error_response(err),
    }
}

fn agile_error_response(err: AgileQueryError) -> Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    let body = match &err {
        AgileQueryError::Members { .. } => Value::Array(Vec::new()),
        other => json!({ "error": other.to_string() }),
    };

    let mut response = (status, Json(body)).into_response();
    ErrorReport::from_error("infra::http::api::agile", status, &err).attach(&mut response);
    response
}
