use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, de::DeserializeOwned};
use tokio::sync::Mutex;

use crate::{
    config::RawgConfig,
    errors::AppError,
    models::{Game, GameDetail, Screenshot},
};

/// Read-only game metadata.
#[async_trait]
pub trait GameCatalog: Send + Sync {
    async fn game(&self, id: &str) -> Result<Game, AppError>;
    async fn screenshots(&self, id: &str) -> Result<Vec<Screenshot>, AppError>;
    /// Other games of the same series.
    async fn related(&self, id: &str) -> Result<Vec<Game>, AppError>;
}

/// Fetches metadata, screenshots and related games concurrently. Any single
/// failure fails the whole detail.
pub async fn load_game_detail(catalog: &dyn GameCatalog, id: &str) -> Result<GameDetail, AppError> {
    let (game, screenshots, related_games) = tokio::try_join!(
        catalog.game(id),
        catalog.screenshots(id),
        catalog.related(id)
    )?;

    Ok(GameDetail {
        game,
        screenshots,
        related_games,
    })
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

#[derive(Clone)]
pub struct RawgClient {
    http: reqwest::Client,
    config: RawgConfig,
}

impl RawgClient {
    pub fn new(config: RawgConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, path: &str) -> Result<T, AppError> {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), path);

        let res = self
            .http
            .get(&url)
            .query(&[("key", &self.config.api_key)])
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to reach game catalog: {}", e);
                AppError::Catalog(format!("Failed to reach game catalog: {}", e))
            })?;

        if res.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Game not found: {}", path)));
        }
        if !res.status().is_success() {
            let msg = format!("Game catalog returned {} for {}", res.status(), path);
            tracing::error!("{}", msg);
            return Err(AppError::Catalog(msg));
        }

        res.json::<T>()
            .await
            .map_err(|e| AppError::Catalog(format!("Invalid catalog response: {}", e)))
    }
}

#[async_trait]
impl GameCatalog for RawgClient {
    async fn game(&self, id: &str) -> Result<Game, AppError> {
        self.fetch(&format!("games/{}", id)).await
    }

    async fn screenshots(&self, id: &str) -> Result<Vec<Screenshot>, AppError> {
        let page: Page<Screenshot> = self.fetch(&format!("games/{}/screenshots", id)).await?;
        Ok(page.results)
    }

    async fn related(&self, id: &str) -> Result<Vec<Game>, AppError> {
        let page: Page<Game> = self.fetch(&format!("games/{}/game-series", id)).await?;
        Ok(page.results)
    }
}

#[derive(Default)]
struct CatalogEntry {
    game: Option<Game>,
    screenshots: Vec<Screenshot>,
    related: Vec<Game>,
}

/// Fixed catalog for local development and tests.
#[derive(Clone, Default)]
pub struct MemoryCatalog {
    entries: Arc<Mutex<HashMap<String, CatalogEntry>>>,
    broken: Arc<Mutex<Option<String>>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, game: Game, screenshots: Vec<Screenshot>, related: Vec<Game>) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            game.id.to_string(),
            CatalogEntry {
                game: Some(game),
                screenshots,
                related,
            },
        );
    }

    /// Makes screenshot lookups fail, to exercise partial failures.
    pub async fn break_screenshots(&self, reason: &str) {
        *self.broken.lock().await = Some(reason.to_string());
    }

    async fn entry<T>(
        &self,
        id: &str,
        read: impl FnOnce(&CatalogEntry) -> Option<T>,
    ) -> Result<T, AppError> {
        let entries = self.entries.lock().await;
        entries
            .get(id)
            .and_then(read)
            .ok_or_else(|| AppError::NotFound(format!("Game not found: {}", id)))
    }
}

#[async_trait]
impl GameCatalog for MemoryCatalog {
    async fn game(&self, id: &str) -> Result<Game, AppError> {
        self.entry(id, |e| e.game.clone()).await
    }

    async fn screenshots(&self, id: &str) -> Result<Vec<Screenshot>, AppError> {
        if let Some(reason) = self.broken.lock().await.clone() {
            return Err(AppError::Catalog(reason));
        }
        self.entry(id, |e| Some(e.screenshots.clone())).await
    }

    async fn related(&self, id: &str) -> Result<Vec<Game>, AppError> {
        self.entry(id, |e| Some(e.related.clone())).await
    }
}
