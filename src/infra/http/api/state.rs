use std::sync::Arc;

use crate::application::agile::AgileQueryService;
use crate::application::posts::PostGateway;
use crate::application::repos::UsersRepo;
use crate::infra::http::HealthProbe;

#[derive(Clone)]
pub struct ApiState {
    pub posts: PostGateway,
    pub users: Arc<dyn UsersRepo>,
    pub agile: AgileQueryService,
    pub health: Arc<dyn HealthProbe>,
    /// Upper bound on concurrent author lookups while rendering a feed.
    pub profile_concurrency: usize,
}
