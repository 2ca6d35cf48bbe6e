// Backend adapter architecture
//
// Each adapter owns one family of translation models and exposes a
// direction-agnostic translate call. Model families are described by data
// (pairs, direction keys, model ids, decoding constants) and share the
// Seq2SeqAdapter implementation:
// - IndicTrans2: English <-> Hindi/Urdu
// - OPUS-MT: English <-> Chinese
//
// To add a new family:
// 1. Describe it with a ModelFamily (see indictrans.rs)
// 2. Register it with the router, with a CodeMap if its internal language
//    spelling differs from the router's codes
// 3. Add it to BackendFactory::create_registrations

pub mod common;
pub mod http;
pub mod indictrans;
pub mod opus_mt;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use common::*;
use crate::config::Config;
use crate::error::Result;
use crate::language::{DirectionPair, LanguageCode};
use crate::router::Registration;

/// Token ids exchanged with the model collaborator
pub type TokenIds = Vec<u32>;

/// One loaded (model, tokenizer) unit.
///
/// Implementations run the tokenizer and network; the adapter only calls
/// them in the fixed encode → generate → decode order.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Seq2SeqModel: Send + Sync {
    /// Tokenize text tagged with source and target languages
    async fn encode(&self, text: &str, source: &str, target: &str) -> anyhow::Result<TokenIds>;

    /// Run generation with fixed decoding parameters
    async fn generate(&self, input: &TokenIds, params: &GenerationParams) -> anyhow::Result<TokenIds>;

    /// Detokenize, skipping special tokens
    async fn decode(&self, output: &TokenIds) -> anyhow::Result<String>;
}

/// Source of model instances (network fetch plus deserialization)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, model_id: &str) -> anyhow::Result<Arc<dyn Seq2SeqModel>>;
}

/// Uniform interface over one model family
#[async_trait]
pub trait BackendAdapter: Send + Sync {
    /// Family name used in logs and errors
    fn name(&self) -> &str;

    /// Directly served pairs in the adapter's own code spelling, in registry order
    fn pairs(&self) -> Vec<DirectionPair>;

    /// True iff the exact ordered pair is in the adapter's registry
    fn supports(&self, source: &LanguageCode, target: &LanguageCode) -> bool;

    /// Translate one text between two of the adapter's languages
    async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String>;

    /// Configured model id per direction key
    fn models(&self) -> Vec<(DirectionKey, String)> {
        Vec::new()
    }

    /// Direction keys whose model is currently loaded, with the load time
    async fn loaded_models(&self) -> Vec<(DirectionKey, Duration)> {
        Vec::new()
    }
}

/// Factory for creating the default adapter registrations
pub struct BackendFactory;

impl BackendFactory {
    /// Create registrations for every shipped family, sharing one model loader
    pub fn create_registrations(
        config: &Config,
        loader: Arc<dyn ModelLoader>,
    ) -> Result<Vec<Registration>> {
        let indic = Seq2SeqAdapter::new(
            indictrans::family(&config.models.indictrans2),
            loader.clone(),
        )?;
        let chinese = Seq2SeqAdapter::new(
            opus_mt::family(&config.models.opus_mt),
            loader,
        )?;

        Ok(vec![
            Registration::new(Arc::new(indic)),
            Registration::with_codes(Arc::new(chinese), opus_mt::code_map()?),
        ])
    }

    /// Create registrations backed by the HTTP model server
    pub fn create_default(config: &Config) -> Result<Vec<Registration>> {
        let loader = http::HttpModelServer::new(&config.server)?;
        Self::create_registrations(config, Arc::new(loader))
    }
}
