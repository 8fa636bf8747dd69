use std::sync::Arc;

use domains::{CatalogRepo, CodeGenerator, Mailer, ReviewRepo, SecretHasher, TokenService, UserRepo};
use services::{AccountService, CatalogService, RatingAggregator, ReviewService};

use crate::metrics::ApiMetrics;

/// Account-side collaborators, grouped to keep the constructor readable.
pub struct AuthPorts {
    pub codes: Arc<dyn CodeGenerator>,
    pub hasher: Arc<dyn SecretHasher>,
    pub tokens: Arc<dyn TokenService>,
    pub mailer: Arc<dyn Mailer>,
}

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub catalog: Arc<CatalogService>,
    pub reviews: Arc<ReviewService>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepo>,
        catalog: Arc<dyn CatalogRepo>,
        reviews: Arc<dyn ReviewRepo>,
        auth: AuthPorts,
    ) -> Self {
        let rating = Arc::new(RatingAggregator::new(Arc::clone(&reviews)));
        Self {
            accounts: Arc::new(AccountService::new(
                users,
                auth.codes,
                auth.hasher,
                auth.tokens,
                auth.mailer,
            )),
            catalog: Arc::new(CatalogService::new(Arc::clone(&catalog), rating)),
            reviews: Arc::new(ReviewService::new(catalog, reviews)),
            metrics: Arc::new(ApiMetrics::new()),
        }
    }
}
