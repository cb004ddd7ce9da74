use std::sync::Arc;

use crate::{
    auth::AccountService,
    backend::{IdentityProvider, RecordStore, memory::MemoryBackend, parse::ParseClient},
    catalog::{GameCatalog, RawgClient},
    config::{BackendKind, Config},
    errors::AppError,
    profile::ProfileService,
    reviews::ReviewRepository,
};

#[derive(Clone)]
pub struct AppState {
    pub accounts: AccountService,
    pub reviews: ReviewRepository,
    pub profiles: ProfileService,
    pub catalog: Arc<dyn GameCatalog>,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn RecordStore>,
        catalog: Arc<dyn GameCatalog>,
        avatar_function: &str,
    ) -> Self {
        Self {
            accounts: AccountService::new(identity.clone()),
            reviews: ReviewRepository::new(store),
            profiles: ProfileService::new(identity, avatar_function),
            catalog,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let catalog: Arc<dyn GameCatalog> = Arc::new(RawgClient::new(config.rawg.clone()));

        let state = match config.backend {
            BackendKind::Parse => {
                let parse = config
                    .parse
                    .clone()
                    .ok_or_else(|| AppError::EnvError("Parse settings are missing".into()))?;
                let client = Arc::new(ParseClient::new(parse));
                Self::new(client.clone(), client, catalog, &config.avatar_function)
            }
            BackendKind::Memory => {
                let backend =
                    Arc::new(MemoryBackend::new().with_avatar_function(&config.avatar_function));
                Self::new(backend.clone(), backend, catalog, &config.avatar_function)
            }
        };

        Ok(state)
    }
}
