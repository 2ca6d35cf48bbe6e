use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of one supported language/script, e.g. `eng_Latn` or `zh`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LanguageCode(String);

impl LanguageCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LanguageCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

impl From<String> for LanguageCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

/// Ordered (source, target) pair. Listing a pair says nothing about its reverse.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DirectionPair {
    pub source: LanguageCode,
    pub target: LanguageCode,
}

impl DirectionPair {
    pub fn new(source: impl Into<LanguageCode>, target: impl Into<LanguageCode>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for DirectionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.source, self.target)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageEntry {
    pub code: LanguageCode,
    /// Human readable display name
    pub name: String,
    /// Short names accepted by the front ends (e.g. "hi", "hindi")
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl LanguageEntry {
    pub fn new(code: &str, name: &str, aliases: &[&str]) -> Self {
        Self {
            code: LanguageCode::new(code),
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// Display-name table in a fixed iteration order.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    entries: Vec<LanguageEntry>,
}

impl LanguageTable {
    pub fn new(entries: Vec<LanguageEntry>) -> Self {
        Self { entries }
    }

    pub fn contains(&self, code: &LanguageCode) -> bool {
        self.entries.iter().any(|e| &e.code == code)
    }

    pub fn codes(&self) -> impl Iterator<Item = &LanguageCode> {
        self.entries.iter().map(|e| &e.code)
    }

    pub fn entries(&self) -> &[LanguageEntry] {
        &self.entries
    }

    /// Display name for a code, falling back to the code itself.
    pub fn display_name(&self, code: &LanguageCode) -> String {
        self.entries
            .iter()
            .find(|e| &e.code == code)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| code.to_string())
    }

    /// Resolve user input (code, alias or display name, case-insensitive) to a code.
    pub fn resolve(&self, input: &str) -> Option<LanguageCode> {
        let needle = input.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.entries
            .iter()
            .find(|e| {
                e.code.as_str().to_lowercase() == needle
                    || e.name.to_lowercase() == needle
                    || e.aliases.iter().any(|a| a.to_lowercase() == needle)
            })
            .map(|e| e.code.clone())
    }
}
