//! Application state for API handlers

use governor::{Quota, RateLimiter};
use sqlx::PgPool;
use std::num::NonZeroU32;
use std::sync::Arc;

use gantry_core::AuthorizationResolver;
use gantry_db::repositories::{
    PgPipelineRepository, PgTemplateRepository, PgTemplateTagRepository, PgUserRepository,
};
use gantry_scm::ScmClient;

use crate::auth::JwtService;

/// Rate limiter type alias for IP-based limiting
pub type IpRateLimiter = RateLimiter<
    String,
    governor::state::keyed::DefaultKeyedStateStore<String>,
    governor::clock::DefaultClock,
>;

/// Concrete application state with all services
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    /// SCM connector client (permission queries, health checks)
    pub scm: Arc<ScmClient>,
    pub template_repo: Arc<PgTemplateRepository>,
    pub tag_repo: Arc<PgTemplateTagRepository>,
    pub pipeline_repo: Arc<PgPipelineRepository>,
    pub user_repo: Arc<PgUserRepository>,
    /// Authorization resolver guarding destructive template operations
    pub resolver: Arc<AuthorizationResolver>,
    pub jwt: Arc<JwtService>,
    /// Global rate limiter by IP
    pub rate_limiter: Arc<IpRateLimiter>,
}

impl AppState {
    /// Create new application state from components
    pub fn new(db_pool: PgPool, scm: ScmClient, jwt: JwtService) -> Self {
        let scm = Arc::new(scm);
        let pipeline_repo = Arc::new(PgPipelineRepository::new(db_pool.clone()));
        let user_repo = Arc::new(PgUserRepository::new(db_pool.clone(), scm.clone()));
        let resolver = Arc::new(AuthorizationResolver::new(
            pipeline_repo.clone(),
            user_repo.clone(),
        ));

        // Rate limiter: 100 requests per second per IP with burst of 200
        let quota = Quota::per_second(NonZeroU32::new(100).unwrap())
            .allow_burst(NonZeroU32::new(200).unwrap());
        let rate_limiter = Arc::new(RateLimiter::keyed(quota));

        Self {
            template_repo: Arc::new(PgTemplateRepository::new(db_pool.clone())),
            tag_repo: Arc::new(PgTemplateTagRepository::new(db_pool.clone())),
            pipeline_repo,
            user_repo,
            resolver,
            db_pool,
            scm,
            jwt: Arc::new(jwt),
            rate_limiter,
        }
    }
}
