use std::sync::Arc;

use crate::{config::AppConfig, repository::FleetRepository};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Arc<dyn FleetRepository>,
}

impl AppState {
    pub fn new(config: AppConfig, repo: Arc<dyn FleetRepository>) -> Self {
        Self {
            config: Arc::new(config),
            repo,
        }
    }
}
