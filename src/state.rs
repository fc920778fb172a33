use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, config: AppConfig) -> Self {
        let orm = crate::db::orm_from_pool(pool.clone());
        Self {
            pool,
            orm,
            config: Arc::new(config),
        }
    }
}
