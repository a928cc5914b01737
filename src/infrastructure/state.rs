//! Application state shared across all handlers

use sea_orm::DatabaseConnection;

use crate::infrastructure::config::Config;

#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    pub config: Config,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> Self {
        Self { db, config }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

// Handlers extract the connection directly
impl axum::extract::FromRef<AppState> for DatabaseConnection {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}
