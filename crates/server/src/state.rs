use std::sync::Arc;

use db::DBService;
use services::services::file_storage::FileStorage;
use sqlx::SqlitePool;

use crate::{auth::JwtService, config::PortalConfig};

#[derive(Clone)]
pub struct AppState {
    pub db: DBService,
    pub storage: FileStorage,
    pub config: Arc<PortalConfig>,
    pub jwt: Arc<JwtService>,
}

impl AppState {
    pub fn new(db: DBService, config: PortalConfig) -> Self {
        let storage = FileStorage::new(db.clone(), config.upload_policy, config.compression);
        let jwt = JwtService::new(config.jwt_secret.clone());
        Self {
            db,
            storage,
            config: Arc::new(config),
            jwt: Arc::new(jwt),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    pub fn storage(&self) -> &FileStorage {
        &self.storage
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn jwt(&self) -> Arc<JwtService> {
        Arc::clone(&self.jwt)
    }
}
