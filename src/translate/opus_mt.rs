//! OPUS-MT family: English ↔ Chinese (Simplified).
//!
//! These models tag English as `en`, while the router uses `eng_Latn`;
//! `code_map` bridges the two spellings at registration.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::language::{DirectionPair, LanguageCode};
use crate::router::CodeMap;
use super::common::{DirectionKey, GenerationParams, ModelFamily};

pub const FAMILY_NAME: &str = "OPUS-MT";

pub const ENGLISH: &str = "en";
/// How the router spells English
pub const ROUTER_ENGLISH: &str = "eng_Latn";
pub const CHINESE: &str = "zh";

pub const EN_TO_ZH: &str = "en_to_zh";
pub const ZH_TO_EN: &str = "zh_to_en";

pub fn generation_params() -> GenerationParams {
    GenerationParams {
        num_beams: 4,
        length_penalty: 0.8,
        no_repeat_ngram_size: 2,
        early_stopping: true,
        max_length: 512,
    }
}

pub fn family(models: &BTreeMap<String, String>) -> ModelFamily {
    ModelFamily {
        name: FAMILY_NAME.to_string(),
        routes: vec![
            (DirectionPair::new(ENGLISH, CHINESE), DirectionKey::new(EN_TO_ZH)),
            (DirectionPair::new(CHINESE, ENGLISH), DirectionKey::new(ZH_TO_EN)),
        ],
        models: models
            .iter()
            .map(|(key, id)| (DirectionKey::new(key.as_str()), id.clone()))
            .collect(),
        params: generation_params(),
    }
}

/// Router code → OPUS-MT code; `zh` is spelled the same on both sides
pub fn code_map() -> Result<CodeMap> {
    CodeMap::new([(LanguageCode::new(ROUTER_ENGLISH), LanguageCode::new(ENGLISH))])
}
