mod agile;
mod posts;
mod users;

pub use agile::agile_query;
pub use posts::{
    add_comment, create_post, delete_post, get_post, list_team_posts, toggle_pin, toggle_reaction,
    update_post,
};
pub use users::get_user;

use axum::extract::State;
use axum::response::Response;

use super::state::ApiState;
use crate::infra::http::db_health_response;

pub async fn health(State(state): State<ApiState>) -> Response {
    db_health_response(state.health.check().await)
}
