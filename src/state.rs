use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::content::store::ContentStore;

/// Process-wide handles: one relational pool, one content-store client,
/// the loaded config. Initialized once at startup, shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub content: Arc<dyn ContentStore>,
    pub config: Config,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Arc<dyn ContentStore> {
    fn from_ref(state: &AppState) -> Self {
        state.content.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
