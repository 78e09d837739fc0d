pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<services::webhook_engine::WebhookEngine>,
}
