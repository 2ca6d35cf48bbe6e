use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use crate::error::{Result, TarjumaError};
use crate::language::{LanguageCode, LanguageEntry, LanguageTable};

// Default values for the model server configuration
fn default_endpoint() -> String {
    "http://localhost:8500".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_preserve_lines() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub files: FilesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Model server endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Request timeout in seconds (model loads can take a while)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Intermediate language used for two-hop translation
    pub pivot: LanguageCode,
    /// Supported languages, in display order
    pub languages: Vec<LanguageEntry>,
}

/// Model ids per family, keyed by direction key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub indictrans2: BTreeMap<String, String>,
    pub opus_mt: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilesConfig {
    /// Translate text files line by line instead of as one block
    #[serde(default = "default_preserve_lines")]
    pub preserve_lines: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            pivot: LanguageCode::new("eng_Latn"),
            languages: vec![
                LanguageEntry::new("eng_Latn", "English", &["en", "english"]),
                LanguageEntry::new("hin_Deva", "Hindi", &["hi", "hindi"]),
                LanguageEntry::new("urd_Arab", "Urdu", &["ur", "urdu"]),
                LanguageEntry::new("zh", "Chinese (Simplified)", &["chinese", "cn"]),
            ],
        }
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        let mut indictrans2 = BTreeMap::new();
        indictrans2.insert(
            "en_to_indic".to_string(),
            "ai4bharat/indictrans2-en-indic-dist-200M".to_string(),
        );
        indictrans2.insert(
            "indic_to_en".to_string(),
            "ai4bharat/indictrans2-indic-en-dist-200M".to_string(),
        );

        let mut opus_mt = BTreeMap::new();
        opus_mt.insert("en_to_zh".to_string(), "Helsinki-NLP/opus-mt-en-zh".to_string());
        opus_mt.insert("zh_to_en".to_string(), "Helsinki-NLP/opus-mt-zh-en".to_string());

        Self { indictrans2, opus_mt }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            preserve_lines: default_preserve_lines(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            router: RouterConfig::default(),
            models: ModelsConfig::default(),
            files: FilesConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TarjumaError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| TarjumaError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TarjumaError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TarjumaError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    pub fn language_table(&self) -> LanguageTable {
        LanguageTable::new(self.router.languages.clone())
    }
}
