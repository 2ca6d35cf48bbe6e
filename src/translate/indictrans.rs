//! IndicTrans2 family: English ↔ Hindi and English ↔ Urdu.
//!
//! Two distilled models cover every pair: one for English → Indic and one
//! for Indic → English. Language tags use the FLORES style (`hin_Deva`).

use std::collections::BTreeMap;

use crate::language::DirectionPair;
use super::common::{DirectionKey, GenerationParams, ModelFamily};

pub const FAMILY_NAME: &str = "IndicTrans2";

pub const ENGLISH: &str = "eng_Latn";
pub const INDIC_LANGUAGES: [&str; 2] = ["hin_Deva", "urd_Arab"];

pub const EN_TO_INDIC: &str = "en_to_indic";
pub const INDIC_TO_EN: &str = "indic_to_en";

pub fn generation_params() -> GenerationParams {
    GenerationParams {
        num_beams: 5,
        length_penalty: 0.8,
        no_repeat_ngram_size: 2,
        early_stopping: true,
        max_length: 256,
    }
}

/// Build the family from configured model ids (direction key → model id)
pub fn family(models: &BTreeMap<String, String>) -> ModelFamily {
    let mut routes = Vec::new();
    for indic in INDIC_LANGUAGES {
        routes.push((DirectionPair::new(ENGLISH, indic), DirectionKey::new(EN_TO_INDIC)));
        routes.push((DirectionPair::new(indic, ENGLISH), DirectionKey::new(INDIC_TO_EN)));
    }

    ModelFamily {
        name: FAMILY_NAME.to_string(),
        routes,
        models: models
            .iter()
            .map(|(key, id)| (DirectionKey::new(key.as_str()), id.clone()))
            .collect(),
        params: generation_params(),
    }
}
