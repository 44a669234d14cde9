use std::convert::Infallible;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{HeaderMap, Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::application::{actor::Actor, error::ErrorReport};

use super::api::error::{ApiError, repo_to_api};
use super::api::state::ApiState;

/// Header carrying the id of the signed-in user.
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct RequestContext {
    pub request_id: String,
}

pub async fn set_request_context(mut request: Request<Body>, next: Next) -> Response {
    let request_id = Uuid::new_v4().to_string();
    let ctx = RequestContext {
        request_id: request_id.clone(),
    };
    request.extensions_mut().insert(ctx.clone());

    let mut response = next.run(request).await;
    response.extensions_mut().insert(ctx);
    response
}

/// Resolve the `x-user-id` header into an [`Actor`] stored in request extensions.
///
/// A missing header leaves the request anonymous. A malformed or unknown id is rejected.
/// The actor is copied onto the response for [`log_responses`].
pub async fn resolve_actor(
    State(state): State<ApiState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let user_id = match header_user_id(request.headers()) {
        Ok(Some(id)) => id,
        Ok(None) => return next.run(request).await,
        Err(raw) => {
            return ApiError::bad_request("Invalid user id header", Some(raw)).into_response();
        }
    };

    match state.users.find_by_id(user_id).await {
        Ok(Some(profile)) => {
            debug!(user_id = %user_id, "actor resolved");
            let actor = Actor::from(&profile);
            request.extensions_mut().insert(actor.clone());
            let mut response = next.run(request).await;
            response.extensions_mut().insert(actor);
            response
        }
        Ok(None) => ApiError::unauthorized(Some(format!("unknown user `{user_id}`"))).into_response(),
        Err(err) => repo_to_api(err).into_response(),
    }
}

fn header_user_id(headers: &HeaderMap) -> Result<Option<Uuid>, String> {
    let Some(value) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| "header is not valid ASCII".to_string())?
        .trim();
    if raw.is_empty() {
        return Ok(None);
    }
    Uuid::parse_str(raw)
        .map(Some)
        .map_err(|err| format!("`{raw}`: {err}"))
}

/// The actor resolved by [`resolve_actor`], `None` for anonymous requests.
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Option<Actor>);

impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<Actor>().cloned()))
    }
}

pub async fn log_responses(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let request_id = request
        .extensions()
        .get::<RequestContext>()
        .map(|ctx| ctx.request_id.clone())
        .unwrap_or_default();

    let mut response = next.run(request).await;
    let status = response.status();
    let actor_id = response
        .extensions()
        .get::<Actor>()
        .map(|actor| actor.id.to_string());

    if status.is_client_error() || status.is_server_error() {
        let elapsed_ms = start.elapsed().as_millis();
        let report = response.extensions_mut().remove::<ErrorReport>();
        let (source, messages) = match report {
            Some(report) => (report.source, report.messages),
            None => ("unknown", Vec::new()),
        };
        let detail = messages
            .first()
            .cloned()
            .unwrap_or_else(|| "no diagnostic available".to_string());

        if status.is_server_error() {
            error!(
                target = "teamboard::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                actor_id = actor_id.as_deref().unwrap_or(""),
                "request failed",
            );
        } else {
            warn!(
                target = "teamboard::http::response",
                status = status.as_u16(),
                method = %method,
                path = %uri.path(),
                query = uri.query().unwrap_or(""),
                elapsed_ms = elapsed_ms,
                source = source,
                detail = %detail,
                chain = ?messages,
                request_id = request_id,
                actor_id = actor_id.as_deref().unwrap_or(""),
                "client request error",
            );
        }
    }

    response
}
