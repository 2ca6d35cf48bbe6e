use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, error, info};

use crate::error::{Result, TarjumaError};
use crate::language::{DirectionPair, LanguageCode};
use super::{BackendAdapter, ModelLoader, Seq2SeqModel};

/// Backend-internal grouping that selects one physical model,
/// e.g. "en_to_indic" serving every English → Indic pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DirectionKey(String);

impl DirectionKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fixed decoding parameters of a model family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub num_beams: u32,
    pub length_penalty: f32,
    pub no_repeat_ngram_size: u32,
    pub early_stopping: bool,
    pub max_length: u32,
}

/// A loaded model bound to its direction key
pub struct ModelHandle {
    pub key: DirectionKey,
    pub model_id: String,
    pub model: Arc<dyn Seq2SeqModel>,
    pub load_time: Duration,
}

/// Per-adapter cache of loaded models, keyed by direction key.
///
/// At most one load runs per key, even under concurrent first use; every
/// caller then shares the same handle. Entries live as long as the cache
/// (no eviction). A failed load leaves the slot empty.
pub struct ModelCache<T> {
    slots: Mutex<HashMap<DirectionKey, Arc<OnceCell<Arc<T>>>>>,
}

impl<T> Default for ModelCache<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ModelCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, running `load` if none exists yet
    pub async fn acquire<F, Fut>(&self, key: &DirectionKey, load: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(value) = slot.get() {
            debug!("Using cached model: {}", key);
            return Ok(value.clone());
        }

        let value = slot
            .get_or_try_init(|| async move { load().await.map(Arc::new) })
            .await?;
        Ok(value.clone())
    }

    /// Loaded values with their keys, sorted by key
    pub async fn loaded(&self) -> Vec<(DirectionKey, Arc<T>)> {
        let slots = self.slots.lock().await;
        let mut loaded: Vec<(DirectionKey, Arc<T>)> = slots
            .iter()
            .filter_map(|(key, slot)| slot.get().map(|value| (key.clone(), value.clone())))
            .collect();
        loaded.sort_by(|a, b| a.0.cmp(&b.0));
        loaded
    }
}

/// Data describing one model family
#[derive(Debug, Clone)]
pub struct ModelFamily {
    pub name: String,
    /// Served pairs and the direction key each one uses, in registry order
    pub routes: Vec<(DirectionPair, DirectionKey)>,
    /// Model id per direction key
    pub models: BTreeMap<DirectionKey, String>,
    pub params: GenerationParams,
}

impl ModelFamily {
    pub fn direction_key(&self, source: &LanguageCode, target: &LanguageCode) -> Option<&DirectionKey> {
        self.routes
            .iter()
            .find(|(pair, _)| &pair.source == source && &pair.target == target)
            .map(|(_, key)| key)
    }

    fn targets_from(&self, source: &LanguageCode) -> Vec<LanguageCode> {
        self.routes
            .iter()
            .filter(|(pair, _)| &pair.source == source)
            .map(|(pair, _)| pair.target.clone())
            .collect()
    }
}

/// Shared adapter for encoder-decoder translation families
pub struct Seq2SeqAdapter {
    family: ModelFamily,
    loader: Arc<dyn ModelLoader>,
    cache: ModelCache<ModelHandle>,
}

impl Seq2SeqAdapter {
    pub fn new(family: ModelFamily, loader: Arc<dyn ModelLoader>) -> Result<Self> {
        for (pair, key) in &family.routes {
            if pair.is_identity() {
                return Err(TarjumaError::Configuration(format!(
                    "{} lists identity pair {}",
                    family.name, pair
                )));
            }
            if !family.models.contains_key(key) {
                return Err(TarjumaError::Configuration(format!(
                    "{} has no model configured for direction key '{}' ({})",
                    family.name, key, pair
                )));
            }
        }

        Ok(Self {
            family,
            loader,
            cache: ModelCache::new(),
        })
    }

    async fn acquire(&self, key: &DirectionKey) -> Result<Arc<ModelHandle>> {
        let model_id = self.family.models.get(key).ok_or_else(|| {
            TarjumaError::Configuration(format!(
                "{} has no model for direction key '{}'",
                self.family.name, key
            ))
        })?;

        self.cache
            .acquire(key, || async {
                info!("Loading {} model: {}", self.family.name, model_id);
                let start = Instant::now();

                let model = self.loader.load(model_id).await.map_err(|e| {
                    error!("Failed to load {} model {}: {}", self.family.name, model_id, e);
                    TarjumaError::backend(&self.family.name, e)
                })?;

                let load_time = start.elapsed();
                info!(
                    "{} model {} loaded successfully in {:.2}s",
                    self.family.name,
                    key,
                    load_time.as_secs_f64()
                );

                Ok::<_, TarjumaError>(ModelHandle {
                    key: key.clone(),
                    model_id: model_id.clone(),
                    model,
                    load_time,
                })
            })
            .await
    }

    async fn run_model(
        &self,
        handle: &ModelHandle,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> anyhow::Result<String> {
        let input = handle
            .model
            .encode(text, source.as_str(), target.as_str())
            .await
            .map_err(|e| e.context("encode failed"))?;
        let output = handle
            .model
            .generate(&input, &self.family.params)
            .await
            .map_err(|e| e.context("generate failed"))?;
        let decoded = handle
            .model
            .decode(&output)
            .await
            .map_err(|e| e.context("decode failed"))?;

        Ok(decoded.trim().to_string())
    }
}

#[async_trait]
impl BackendAdapter for Seq2SeqAdapter {
    fn name(&self) -> &str {
        &self.family.name
    }

    fn pairs(&self) -> Vec<DirectionPair> {
        self.family.routes.iter().map(|(pair, _)| pair.clone()).collect()
    }

    fn supports(&self, source: &LanguageCode, target: &LanguageCode) -> bool {
        self.family.direction_key(source, target).is_some()
    }

    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String> {
        let Some(key) = self.family.direction_key(source, target) else {
            return Err(TarjumaError::UnsupportedPair {
                src: source.clone(),
                tgt: target.clone(),
                available: self.family.targets_from(source),
            });
        };

        if source == target || text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let handle = self.acquire(key).await?;

        let start = Instant::now();
        debug!("{} translating with {} ({})", self.family.name, handle.key, handle.model_id);

        let result = self
            .run_model(&handle, text, source, target)
            .await
            .map_err(|e| {
                error!("{} translation failed: {:#}", self.family.name, e);
                TarjumaError::backend(&self.family.name, e)
            })?;

        info!(
            "{} translation {} → {} completed in {:.2}s",
            self.family.name,
            source,
            target,
            start.elapsed().as_secs_f64()
        );

        Ok(result)
    }

    fn models(&self) -> Vec<(DirectionKey, String)> {
        self.family
            .models
            .iter()
            .map(|(key, id)| (key.clone(), id.clone()))
            .collect()
    }

    async fn loaded_models(&self) -> Vec<(DirectionKey, Duration)> {
        self.cache
            .loaded()
            .await
            .into_iter()
            .map(|(key, handle)| (key, handle.load_time))
            .collect()
    }
}
