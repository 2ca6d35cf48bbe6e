//! Language-pair routing across backend adapters.
//!
//! The router owns the direct-pair registry (each pair served by exactly one
//! adapter), the display-name table and the pivot language. Requests with no
//! direct pair can be bridged through the pivot in exactly two hops.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{Result, TarjumaError};
use crate::language::{DirectionPair, LanguageCode, LanguageTable};
use crate::translate::{BackendAdapter, DirectionKey};

/// How a front end wants a request routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMode {
    /// Only direct pairs; anything else is `UnsupportedPair`
    #[default]
    Direct,
    /// Direct pair when available, otherwise two hops via the pivot
    MultiStep,
}

/// Mapping between router codes and an adapter's own spelling.
/// Codes without an entry are spelled the same on both sides.
#[derive(Debug, Clone, Default)]
pub struct CodeMap {
    to_internal: HashMap<LanguageCode, LanguageCode>,
    to_external: HashMap<LanguageCode, LanguageCode>,
}

impl CodeMap {
    /// Build a one-to-one mapping. Two router codes sharing one internal
    /// code, or one router code mapped twice, is a `Configuration` error.
    pub fn new(entries: impl IntoIterator<Item = (LanguageCode, LanguageCode)>) -> Result<Self> {
        let mut map = Self::default();
        for (external, internal) in entries {
            if let Some(previous) = map.to_external.get(&internal) {
                return Err(TarjumaError::Configuration(format!(
                    "code map sends both '{}' and '{}' to '{}'",
                    previous, external, internal
                )));
            }
            if let Some(previous) = map.to_internal.get(&external) {
                return Err(TarjumaError::Configuration(format!(
                    "code map sends '{}' to both '{}' and '{}'",
                    external, previous, internal
                )));
            }
            map.to_external.insert(internal.clone(), external.clone());
            map.to_internal.insert(external, internal);
        }
        Ok(map)
    }

    pub fn to_internal(&self, code: &LanguageCode) -> LanguageCode {
        self.to_internal.get(code).cloned().unwrap_or_else(|| code.clone())
    }

    pub fn to_external(&self, code: &LanguageCode) -> LanguageCode {
        self.to_external.get(code).cloned().unwrap_or_else(|| code.clone())
    }
}

/// One adapter plus the code spelling it expects
pub struct Registration {
    adapter: Arc<dyn BackendAdapter>,
    codes: CodeMap,
}

impl Registration {
    pub fn new(adapter: Arc<dyn BackendAdapter>) -> Self {
        Self::with_codes(adapter, CodeMap::default())
    }

    pub fn with_codes(adapter: Arc<dyn BackendAdapter>, codes: CodeMap) -> Self {
        Self { adapter, codes }
    }
}

/// Summary of one registered backend, for system info displays
#[derive(Debug, Clone)]
pub struct BackendInfo {
    pub name: String,
    /// Served pairs in router codes
    pub pairs: Vec<DirectionPair>,
    pub models: Vec<(DirectionKey, String)>,
    /// Loaded models with their load time
    pub loaded: Vec<(DirectionKey, Duration)>,
}

pub struct RouterBuilder {
    languages: LanguageTable,
    pivot: LanguageCode,
    registrations: Vec<Registration>,
}

impl RouterBuilder {
    pub fn register(mut self, registration: Registration) -> Self {
        self.registrations.push(registration);
        self
    }

    pub fn register_all(mut self, registrations: impl IntoIterator<Item = Registration>) -> Self {
        self.registrations.extend(registrations);
        self
    }

    /// Resolve the pair registry. Conflicting or unknown pairs are rejected here,
    /// never at call time.
    pub fn build(self) -> Result<Router> {
        if !self.languages.contains(&self.pivot) {
            return Err(TarjumaError::Configuration(format!(
                "pivot language '{}' is not in the language table",
                self.pivot
            )));
        }

        let mut pairs = Vec::new();
        let mut routes: HashMap<DirectionPair, usize> = HashMap::new();

        for (index, registration) in self.registrations.iter().enumerate() {
            for internal in registration.adapter.pairs() {
                let pair = DirectionPair::new(
                    registration.codes.to_external(&internal.source),
                    registration.codes.to_external(&internal.target),
                );

                if pair.is_identity() {
                    return Err(TarjumaError::Configuration(format!(
                        "{} registers identity pair {}",
                        registration.adapter.name(),
                        pair
                    )));
                }

                for code in [&pair.source, &pair.target] {
                    if !self.languages.contains(code) {
                        return Err(TarjumaError::Configuration(format!(
                            "{} serves {} but '{}' is not in the language table",
                            registration.adapter.name(),
                            pair,
                            code
                        )));
                    }
                }

                if let Some(&existing) = routes.get(&pair) {
                    return Err(TarjumaError::Configuration(format!(
                        "pair {} is claimed by both {} and {}",
                        pair,
                        self.registrations[existing].adapter.name(),
                        registration.adapter.name()
                    )));
                }

                routes.insert(pair.clone(), index);
                pairs.push(pair);
            }
        }

        info!(
            "Router initialized: {} languages, {} direct pairs, {} backends, pivot {}",
            self.languages.entries().len(),
            pairs.len(),
            self.registrations.len(),
            self.pivot
        );

        Ok(Router {
            languages: self.languages,
            pivot: self.pivot,
            pairs,
            routes,
            registrations: self.registrations,
        })
    }
}

pub struct Router {
    languages: LanguageTable,
    pivot: LanguageCode,
    /// Direct pairs in registration order
    pairs: Vec<DirectionPair>,
    routes: HashMap<DirectionPair, usize>,
    registrations: Vec<Registration>,
}

impl Router {
    pub fn builder(languages: LanguageTable, pivot: LanguageCode) -> RouterBuilder {
        RouterBuilder {
            languages,
            pivot,
            registrations: Vec::new(),
        }
    }

    pub fn from_config(config: &Config, registrations: Vec<Registration>) -> Result<Self> {
        Self::builder(config.language_table(), config.router.pivot.clone())
            .register_all(registrations)
            .build()
    }

    pub fn languages(&self) -> &LanguageTable {
        &self.languages
    }

    pub fn pivot(&self) -> &LanguageCode {
        &self.pivot
    }

    pub fn pairs(&self) -> &[DirectionPair] {
        &self.pairs
    }

    pub fn is_supported_pair(&self, source: &LanguageCode, target: &LanguageCode) -> bool {
        self.routes
            .contains_key(&DirectionPair::new(source.clone(), target.clone()))
    }

    /// Direct pair, or a source → pivot → target path of at most two hops
    pub fn is_multistep_supported(&self, source: &LanguageCode, target: &LanguageCode) -> bool {
        if self.is_supported_pair(source, target) {
            return true;
        }

        let to_pivot = source == &self.pivot || self.is_supported_pair(source, &self.pivot);
        let from_pivot = target == &self.pivot || self.is_supported_pair(&self.pivot, target);
        to_pivot && from_pivot
    }

    pub fn get_available_targets(
        &self,
        source: &LanguageCode,
        include_multistep: bool,
    ) -> Vec<LanguageCode> {
        if include_multistep {
            self.languages
                .codes()
                .filter(|code| *code != source)
                .filter(|code| self.is_multistep_supported(source, code))
                .cloned()
                .collect()
        } else {
            self.pairs
                .iter()
                .filter(|pair| &pair.source == source)
                .map(|pair| pair.target.clone())
                .collect()
        }
    }

    /// Translate over a direct pair
    pub async fn translate(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String> {
        if source == target {
            return Ok(text.to_string());
        }

        let pair = DirectionPair::new(source.clone(), target.clone());
        let Some(&index) = self.routes.get(&pair) else {
            return Err(TarjumaError::UnsupportedPair {
                src: source.clone(),
                tgt: target.clone(),
                available: self.get_available_targets(source, false),
            });
        };

        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let registration = &self.registrations[index];
        let internal_source = registration.codes.to_internal(source);
        let internal_target = registration.codes.to_internal(target);

        info!(
            "Translating {} via {}: '{}'",
            pair,
            registration.adapter.name(),
            text
        );
        debug!("Adapter codes: {} → {}", internal_source, internal_target);

        let start = Instant::now();
        let result = registration
            .adapter
            .translate(text, &internal_source, &internal_target)
            .await
            .map_err(|e| {
                error!("Translation {} failed: {}", pair, e);
                e
            })?;

        info!(
            "Translation {} completed in {:.2}s: '{}'",
            pair,
            start.elapsed().as_secs_f64(),
            result
        );

        Ok(result)
    }

    /// Translate directly when possible, otherwise source → pivot → target
    pub async fn translate_multi_step(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String> {
        if source == target {
            return Ok(text.to_string());
        }

        if self.is_supported_pair(source, target) {
            return self.translate(text, source, target).await;
        }

        if !self.is_multistep_supported(source, target) {
            return Err(TarjumaError::NoPivotPath {
                src: source.clone(),
                tgt: target.clone(),
                pivot: self.pivot.clone(),
            });
        }

        info!(
            "Multi-step translation: {} → {} → {}",
            source, self.pivot, target
        );

        let intermediate = if source != &self.pivot {
            let text = self.translate(text, source, &self.pivot).await?;
            info!("Step 1 complete: {} → {}: '{}'", source, self.pivot, text);
            text
        } else {
            text.to_string()
        };

        let result = if target != &self.pivot {
            let text = self.translate(&intermediate, &self.pivot, target).await?;
            info!("Step 2 complete: {} → {}: '{}'", self.pivot, target, text);
            text
        } else {
            intermediate
        };

        Ok(result)
    }

    pub async fn translate_with(
        &self,
        mode: RouteMode,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
    ) -> Result<String> {
        match mode {
            RouteMode::Direct => self.translate(text, source, target).await,
            RouteMode::MultiStep => self.translate_multi_step(text, source, target).await,
        }
    }

    pub async fn backends(&self) -> Vec<BackendInfo> {
        let mut infos = Vec::with_capacity(self.registrations.len());
        for (index, registration) in self.registrations.iter().enumerate() {
            infos.push(BackendInfo {
                name: registration.adapter.name().to_string(),
                pairs: self
                    .pairs
                    .iter()
                    .filter(|pair| self.routes.get(*pair) == Some(&index))
                    .cloned()
                    .collect(),
                models: registration.adapter.models(),
                loaded: registration.adapter.loaded_models().await,
            });
        }
        infos
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::LanguageEntry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    type CallLog = Arc<Mutex<Vec<String>>>;

    /// Adapter that tags its output and records every call
    struct RecordingAdapter {
        name: String,
        pairs: Vec<DirectionPair>,
        calls: CallLog,
        fail: bool,
    }

    impl RecordingAdapter {
        fn new(name: &str, pairs: &[(&str, &str)], calls: &CallLog) -> Self {
            Self {
                name: name.to_string(),
                pairs: pairs.iter().map(|(s, t)| DirectionPair::new(*s, *t)).collect(),
                calls: calls.clone(),
                fail: false,
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }
    }

    #[async_trait]
    impl BackendAdapter for RecordingAdapter {
        fn name(&self) -> &str {
            &self.name
        }

        fn pairs(&self) -> Vec<DirectionPair> {
            self.pairs.clone()
        }

        fn supports(&self, source: &LanguageCode, target: &LanguageCode) -> bool {
            self.pairs
                .iter()
                .any(|p| &p.source == source && &p.target == target)
        }

        async fn translate(
            &self,
            text: &str,
            source: &LanguageCode,
            target: &LanguageCode,
        ) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{}:{}>{}:{}", self.name, source, target, text));
            if self.fail {
                return Err(TarjumaError::backend(&self.name, anyhow::anyhow!("boom")));
            }
            Ok(format!("{}[{}>{}]", text, source, target))
        }
    }

    fn table(codes: &[&str]) -> LanguageTable {
        LanguageTable::new(
            codes
                .iter()
                .map(|c| LanguageEntry::new(c, &c.to_uppercase(), &[]))
                .collect(),
        )
    }

    fn code(c: &str) -> LanguageCode {
        LanguageCode::new(c)
    }

    /// A: L1 ↔ P, B: P ↔ L2
    fn two_family_router(calls: &CallLog) -> Router {
        Router::builder(table(&["P", "L1", "L2"]), code("P"))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "A",
                &[("L1", "P"), ("P", "L1")],
                calls,
            ))))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "B",
                &[("P", "L2"), ("L2", "P")],
                calls,
            ))))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_identity_never_reaches_a_backend() {
        let calls = CallLog::default();
        let router = two_family_router(&calls);

        for lang in ["P", "L1", "L2", "unknown"] {
            let out = router.translate("same text", &code(lang), &code(lang)).await.unwrap();
            assert_eq!(out, "same text");
            let out = router
                .translate_multi_step("same text", &code(lang), &code(lang))
                .await
                .unwrap();
            assert_eq!(out, "same text");
            assert!(!router.is_supported_pair(&code(lang), &code(lang)));
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_text_is_returned_unchanged() {
        let calls = CallLog::default();
        let router = two_family_router(&calls);

        for text in ["", "   "] {
            assert_eq!(router.translate(text, &code("L1"), &code("P")).await.unwrap(), text);
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_direct_pairs_dispatch_to_their_adapter() {
        let calls = CallLog::default();
        let router = two_family_router(&calls);

        for (s, t, adapter) in [("L1", "P", "A"), ("P", "L1", "A"), ("P", "L2", "B"), ("L2", "P", "B")] {
            assert!(router.is_supported_pair(&code(s), &code(t)));
            calls.lock().unwrap().clear();

            let out = router.translate("x", &code(s), &code(t)).await.unwrap();
            assert_eq!(out, format!("x[{}>{}]", s, t));
            assert_eq!(*calls.lock().unwrap(), vec![format!("{}:{}>{}:x", adapter, s, t)]);
        }
    }

    #[tokio::test]
    async fn test_unsupported_pair_carries_direct_targets() {
        let calls = CallLog::default();
        let router = two_family_router(&calls);

        let err = router.translate("x", &code("L1"), &code("L2")).await.unwrap_err();
        assert!(err.suggests_multi_step());
        match err {
            TarjumaError::UnsupportedPair { src, tgt, available } => {
                assert_eq!(src, code("L1"));
                assert_eq!(tgt, code("L2"));
                assert_eq!(available, vec![code("P")]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_multi_step_composes_hops_in_order() {
        let calls = CallLog::default();
        let router = two_family_router(&calls);

        assert!(!router.is_supported_pair(&code("L1"), &code("L2")));
        assert!(router.is_multistep_supported(&code("L1"), &code("L2")));

        let out = router
            .translate_multi_step("x", &code("L1"), &code("L2"))
            .await
            .unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["A:L1>P:x".to_string(), "B:P>L2:x[L1>P]".to_string()]
        );

        let hop1 = router.translate("x", &code("L1"), &code("P")).await.unwrap();
        let composed = router.translate(&hop1, &code("P"), &code("L2")).await.unwrap();
        assert_eq!(out, composed);
    }

    #[tokio::test]
    async fn test_multi_step_prefers_direct_pair() {
        let calls = CallLog::default();
        let router = two_family_router(&calls);

        let multi = router
            .translate_multi_step("x", &code("L1"), &code("P"))
            .await
            .unwrap();
        let direct = router.translate("x", &code("L1"), &code("P")).await.unwrap();
        assert_eq!(multi, direct);
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_no_path_through_non_pivot_intermediate() {
        let calls = CallLog::default();
        // L1 ↔ L3 ↔ L2 exists, but nothing touches the pivot
        let router = Router::builder(table(&["P", "L1", "L2", "L3"]), code("P"))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "A",
                &[("L1", "L3"), ("L3", "L1")],
                &calls,
            ))))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "B",
                &[("L3", "L2"), ("L2", "L3")],
                &calls,
            ))))
            .build()
            .unwrap();

        assert!(!router.is_multistep_supported(&code("L1"), &code("L2")));
        let err = router
            .translate_multi_step("x", &code("L1"), &code("L2"))
            .await
            .unwrap_err();
        assert!(matches!(err, TarjumaError::NoPivotPath { ref pivot, .. } if pivot == &code("P")));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_hop_failure_fails_whole_request() {
        let calls = CallLog::default();
        let router = Router::builder(table(&["P", "L1", "L2"]), code("P"))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "A",
                &[("L1", "P"), ("P", "L1")],
                &calls,
            ))))
            .register(Registration::new(Arc::new(
                RecordingAdapter::new("B", &[("P", "L2"), ("L2", "P")], &calls).failing(),
            )))
            .build()
            .unwrap();

        let err = router
            .translate_multi_step("x", &code("L1"), &code("L2"))
            .await
            .unwrap_err();
        assert!(matches!(err, TarjumaError::BackendFailure { ref backend, .. } if backend == "B"));
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_conflicting_registration_is_rejected() {
        let calls = CallLog::default();
        let result = Router::builder(table(&["P", "L1"]), code("P"))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "A",
                &[("L1", "P")],
                &calls,
            ))))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "B",
                &[("P", "L1"), ("L1", "P")],
                &calls,
            ))))
            .build();

        match result {
            Err(TarjumaError::Configuration(message)) => {
                assert!(message.contains("claimed by both A and B"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("conflict was accepted"),
        }
    }

    #[test]
    fn test_unknown_languages_are_rejected() {
        let calls = CallLog::default();
        let result = Router::builder(table(&["P"]), code("P"))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "A",
                &[("P", "L9")],
                &calls,
            ))))
            .build();
        assert!(matches!(result, Err(TarjumaError::Configuration(_))));

        let result = Router::builder(table(&["L1"]), code("P")).build();
        assert!(matches!(result, Err(TarjumaError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_code_map_is_applied_at_dispatch() {
        let calls = CallLog::default();
        let codes = CodeMap::new([(code("eng_Latn"), code("en"))]).unwrap();
        let router = Router::builder(table(&["eng_Latn", "zh"]), code("eng_Latn"))
            .register(Registration::with_codes(
                Arc::new(RecordingAdapter::new("OPUS", &[("en", "zh"), ("zh", "en")], &calls)),
                codes,
            ))
            .build()
            .unwrap();

        assert!(router.is_supported_pair(&code("eng_Latn"), &code("zh")));
        assert!(!router.is_supported_pair(&code("en"), &code("zh")));

        router.translate("hi", &code("eng_Latn"), &code("zh")).await.unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["OPUS:en>zh:hi".to_string()]);

        let err = router.translate("hi", &code("zh"), &code("fr")).await.unwrap_err();
        match err {
            TarjumaError::UnsupportedPair { available, .. } => {
                assert_eq!(available, vec![code("eng_Latn")]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_code_map_must_be_one_to_one() {
        for _ in 0..8 {
            let err = CodeMap::new([
                (code("eng_Latn"), code("en")),
                (code("eng_US"), code("en")),
            ])
            .unwrap_err();
            match err {
                TarjumaError::Configuration(message) => {
                    assert_eq!(message, "code map sends both 'eng_Latn' and 'eng_US' to 'en'");
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        let result = CodeMap::new([(code("eng_Latn"), code("en")), (code("eng_Latn"), code("eng"))]);
        assert!(matches!(result, Err(TarjumaError::Configuration(_))));

        let codes = CodeMap::new([(code("eng_Latn"), code("en")), (code("zho_Hans"), code("zh"))]).unwrap();
        assert_eq!(codes.to_external(&code("zh")), code("zho_Hans"));
        assert_eq!(codes.to_external(&code("en")), code("eng_Latn"));
        assert_eq!(codes.to_external(&code("hi")), code("hi"));
    }

    #[tokio::test]
    async fn test_available_targets_keep_registration_and_table_order() {
        let calls = CallLog::default();
        let router = Router::builder(table(&["eng_Latn", "hin_Deva", "urd_Arab", "zh"]), code("eng_Latn"))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "Indic",
                &[
                    ("eng_Latn", "hin_Deva"),
                    ("hin_Deva", "eng_Latn"),
                    ("eng_Latn", "urd_Arab"),
                    ("urd_Arab", "eng_Latn"),
                ],
                &calls,
            ))))
            .register(Registration::new(Arc::new(RecordingAdapter::new(
                "Chinese",
                &[("eng_Latn", "zh"), ("zh", "eng_Latn")],
                &calls,
            ))))
            .build()
            .unwrap();

        assert_eq!(
            router.get_available_targets(&code("eng_Latn"), false),
            vec![code("hin_Deva"), code("urd_Arab"), code("zh")]
        );
        assert_eq!(
            router.get_available_targets(&code("hin_Deva"), false),
            vec![code("eng_Latn")]
        );
        assert_eq!(
            router.get_available_targets(&code("hin_Deva"), true),
            vec![code("eng_Latn"), code("urd_Arab"), code("zh")]
        );
        assert_eq!(
            router.get_available_targets(&code("zh"), true),
            vec![code("eng_Latn"), code("hin_Deva"), code("urd_Arab")]
        );

        let backends = router.backends().await;
        assert_eq!(backends.len(), 2);
        assert_eq!(backends[0].pairs.len(), 4);
        assert_eq!(backends[1].name, "Chinese");
        assert_eq!(backends[1].pairs, vec![DirectionPair::new("eng_Latn", "zh"), DirectionPair::new("zh", "eng_Latn")]);
    }

    #[tokio::test]
    async fn test_translate_with_forwards_mode() {
        let calls = CallLog::default();
        let router = two_family_router(&calls);

        let err = router
            .translate_with(RouteMode::Direct, "x", &code("L1"), &code("L2"))
            .await
            .unwrap_err();
        assert!(matches!(err, TarjumaError::UnsupportedPair { .. }));

        let out = router
            .translate_with(RouteMode::MultiStep, "x", &code("L1"), &code("L2"))
            .await
            .unwrap();
        assert_eq!(out, "x[L1>P][P>L2]");
    }
}
