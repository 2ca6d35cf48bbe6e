use std::path::Path;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;

use crate::config::Config;
use crate::error::{Result, TarjumaError};
use crate::files::{DirectoryReport, FileOptions, FileReport, FileTranslator};
use crate::interactive::InteractiveSession;
use crate::language::LanguageCode;
use crate::router::{BackendInfo, Registration, RouteMode, Router};
use crate::translate::BackendFactory;

/// Result of a single text translation
#[derive(Debug, Clone)]
pub struct TextOutcome {
    pub text: String,
    /// "direct" or "multi-step"
    pub method: &'static str,
}

pub struct Workflow {
    config: Config,
    router: Arc<Router>,
    files: FileTranslator,
}

impl Workflow {
    /// Build the router over the model server configured in `config`
    pub fn new(config: Config) -> Result<Self> {
        let registrations = BackendFactory::create_default(&config)?;
        Self::with_registrations(config, registrations)
    }

    pub fn with_registrations(config: Config, registrations: Vec<Registration>) -> Result<Self> {
        let router = Arc::new(Router::from_config(&config, registrations)?);
        let files = FileTranslator::new(router.clone());

        Ok(Self {
            config,
            router,
            files,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Accept a code, alias or display name
    pub fn resolve_language(&self, input: &str) -> Result<LanguageCode> {
        self.router.languages().resolve(input).ok_or_else(|| {
            let supported: Vec<&str> = self
                .router
                .languages()
                .codes()
                .map(LanguageCode::as_str)
                .collect();
            TarjumaError::Config(format!(
                "Unknown language '{}'. Supported: {}",
                input,
                supported.join(", ")
            ))
        })
    }

    pub fn file_options(
        &self,
        multi_step: bool,
        fields: Option<Vec<String>>,
        columns: Option<Vec<String>>,
    ) -> FileOptions {
        FileOptions {
            mode: route_mode(multi_step),
            fields,
            columns,
            preserve_lines: self.config.files.preserve_lines,
            format: None,
        }
    }

    pub async fn translate_text(
        &self,
        text: &str,
        source: &LanguageCode,
        target: &LanguageCode,
        multi_step: bool,
    ) -> Result<TextOutcome> {
        let method = if self.router.is_supported_pair(source, target) || source == target {
            "direct"
        } else {
            "multi-step"
        };

        let text = self
            .router
            .translate_with(route_mode(multi_step), text, source, target)
            .await?;

        Ok(TextOutcome { text, method })
    }

    pub async fn translate_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        source: &LanguageCode,
        target: &LanguageCode,
        options: &FileOptions,
    ) -> Result<FileReport> {
        self.files
            .translate_file(input, output, source, target, options)
            .await
    }

    pub async fn translate_directory(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        source: &LanguageCode,
        target: &LanguageCode,
        options: &FileOptions,
    ) -> Result<DirectoryReport> {
        self.files
            .translate_directory(input_dir, output_dir, source, target, options)
            .await
    }

    /// Run the prompt loop on stdin/stdout
    pub async fn interactive(&self) -> Result<()> {
        info!("Starting interactive session");
        let stdin = BufReader::new(tokio::io::stdin());
        let mut session = InteractiveSession::new(
            &self.router,
            &self.files,
            self.config.files.preserve_lines,
            stdin,
            std::io::stdout(),
        );
        session.run().await
    }

    /// Served pairs, configured models and loaded models per backend
    pub async fn system_info(&self) -> Vec<BackendInfo> {
        self.router.backends().await
    }
}

fn route_mode(multi_step: bool) -> RouteMode {
    if multi_step {
        RouteMode::MultiStep
    } else {
        RouteMode::Direct
    }
}
