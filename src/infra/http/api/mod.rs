pub mod error;
pub mod handlers;
pub mod models;
pub mod state;

pub use state::ApiState;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, patch, post},
};

use crate::infra::http::middleware::{log_responses, resolve_actor, set_request_context};

pub fn build_api_router(state: ApiState) -> Router {
    let actor_state = state.clone();

    Router::new()
        .route(
            "/api/v1/teams/{team_id}/posts",
            get(handlers::list_team_posts).post(handlers::create_post),
        )
        .route("/api/v1/teams/agile", get(handlers::agile_query))
        .route(
            "/api/v1/posts/{id}",
            get(handlers::get_post)
                .patch(handlers::update_post)
                .delete(handlers::delete_post),
        )
        .route("/api/v1/posts/{id}/pin", post(handlers::toggle_pin))
        .route(
            "/api/v1/posts/{id}/reactions",
            post(handlers::toggle_reaction),
        )
        .route("/api/v1/posts/{id}/comments", post(handlers::add_comment))
        .route("/api/v1/users/{id}", get(handlers::get_user))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            actor_state,
            resolve_actor,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
