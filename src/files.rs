use chrono::{DateTime, Local};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::batch::{self, BatchStats, Document};
use crate::error::{Result, TarjumaError};
use crate::language::LanguageCode;
use crate::router::{RouteMode, Router};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Text,
    Json,
    Csv,
}

impl FileFormat {
    pub const EXTENSIONS: [&'static str; 3] = ["txt", "json", "csv"];

    /// Detect the format from the file extension (case-insensitive)
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();

        extension.parse().map_err(|_| {
            TarjumaError::UnsupportedFormat(format!(
                "'{}' (supported: {})",
                path.display(),
                Self::EXTENSIONS.join(", ")
            ))
        })
    }
}

impl FromStr for FileFormat {
    type Err = TarjumaError;

    fn from_str(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(TarjumaError::UnsupportedFormat(format!(
                "'{}' (supported: {})",
                name,
                Self::EXTENSIONS.join(", ")
            ))),
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::Json => "json",
            Self::Csv => "csv",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct FileOptions {
    pub mode: RouteMode,
    /// JSON keys to translate (all when unset)
    pub fields: Option<Vec<String>>,
    /// CSV columns to translate (all when unset)
    pub columns: Option<Vec<String>>,
    /// Translate text files line by line
    pub preserve_lines: bool,
    /// Overrides extension-based format detection
    pub format: Option<FileFormat>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            mode: RouteMode::Direct,
            fields: None,
            columns: None,
            preserve_lines: true,
            format: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub source: LanguageCode,
    pub target: LanguageCode,
    pub format: FileFormat,
    pub stats: BatchStats,
    pub completed_at: DateTime<Local>,
}

#[derive(Debug, Default)]
pub struct DirectoryReport {
    pub files: Vec<FileReport>,
    /// Files that could not be translated, with the reason
    pub failed: Vec<(PathBuf, String)>,
}

fn translated_suffix(target: &LanguageCode) -> String {
    format!("_translated_{}", target)
}

/// True for files named like a previous run's output for `target`
pub fn is_translated_output(path: &Path, target: &LanguageCode) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|stem| stem.ends_with(&translated_suffix(target)))
}

/// `<stem>_translated_<target><ext>` next to the input
pub fn default_output_path(input: &Path, target: &LanguageCode) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    input.with_file_name(format!("{}{}{}", stem, translated_suffix(target), extension))
}

/// Reads, translates and writes txt/json/csv documents through the router
pub struct FileTranslator {
    router: Arc<Router>,
}

impl FileTranslator {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    pub async fn translate_file(
        &self,
        input: &Path,
        output: Option<&Path>,
        source: &LanguageCode,
        target: &LanguageCode,
        options: &FileOptions,
    ) -> Result<FileReport> {
        if !input.is_file() {
            return Err(TarjumaError::FileNotFound(input.display().to_string()));
        }
        let format = match options.format {
            Some(format) => format,
            None => FileFormat::from_path(input)?,
        };

        let output = match output {
            Some(path) => path.to_path_buf(),
            None => default_output_path(input, target),
        };

        info!(
            "Translating {} file {} ({} → {})",
            format,
            input.display(),
            source,
            target
        );

        let content = fs::read_to_string(input).await?;
        let (document, filter) = match format {
            FileFormat::Text if options.preserve_lines => {
                (Document::Lines(content.split('\n').map(str::to_string).collect()), None)
            }
            FileFormat::Text => (Document::Lines(vec![content]), None),
            FileFormat::Json => (Document::Tree(serde_json::from_str(&content)?), options.fields.as_deref()),
            FileFormat::Csv => (read_table(&content)?, options.columns.as_deref()),
        };

        let (document, stats) =
            batch::traverse(&self.router, document, source, target, options.mode, filter).await?;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        fs::write(&output, render(&document)?).await?;

        info!(
            "Translated {} → {} ({} leaves, {} failed) in {:.2}s",
            input.display(),
            output.display(),
            stats.succeeded,
            stats.failed,
            stats.elapsed.as_secs_f64()
        );

        Ok(FileReport {
            input: input.to_path_buf(),
            output,
            source: source.clone(),
            target: target.clone(),
            format,
            stats,
            completed_at: Local::now(),
        })
    }

    /// Translate every supported file under `input_dir`.
    ///
    /// Relative paths are mirrored under `output_dir` (the input directory
    /// when unset). A failing file is logged and skipped, and outputs of an
    /// earlier run for the same target are never re-translated.
    pub async fn translate_directory(
        &self,
        input_dir: &Path,
        output_dir: Option<&Path>,
        source: &LanguageCode,
        target: &LanguageCode,
        options: &FileOptions,
    ) -> Result<DirectoryReport> {
        info!("Translating directory: {}", input_dir.display());

        if !input_dir.is_dir() {
            return Err(TarjumaError::Config(format!(
                "Input path is not a directory: {}",
                input_dir.display()
            )));
        }

        let output_dir = output_dir.unwrap_or(input_dir);
        fs::create_dir_all(output_dir).await?;

        let mut files = Vec::new();
        for entry in WalkDir::new(input_dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() || FileFormat::from_path(entry.path()).is_err() {
                continue;
            }
            if is_translated_output(entry.path(), target) {
                debug!("Skipping earlier output: {}", entry.path().display());
                continue;
            }
            files.push(entry.path().to_path_buf());
        }

        info!("Found {} files to translate", files.len());

        let progress = ProgressBar::new(files.len() as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let mut report = DirectoryReport::default();
        for path in files {
            progress.set_message(path.display().to_string());

            let relative = pathdiff::diff_paths(&path, input_dir).unwrap_or_else(|| path.clone());
            let output = default_output_path(&output_dir.join(relative), target);

            match self
                .translate_file(&path, Some(&output), source, target, options)
                .await
            {
                Ok(file_report) => {
                    info!("Successfully translated: {}", path.display());
                    report.files.push(file_report);
                }
                Err(e) => {
                    warn!("Failed to translate {}: {}", path.display(), e);
                    report.failed.push((path, e.to_string()));
                }
            }
            progress.inc(1);
        }

        progress.finish_with_message(format!(
            "{} translated, {} failed",
            report.files.len(),
            report.failed.len()
        ));

        Ok(report)
    }
}

fn read_table(content: &str) -> Result<Document> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }

    Ok(Document::Table { headers, rows })
}

fn render(document: &Document) -> Result<String> {
    match document {
        Document::Lines(lines) => Ok(lines.join("\n")),
        Document::Tree(value) => Ok(serde_json::to_string_pretty(value)?),
        Document::Table { headers, rows } => {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_writer(Vec::new());
            writer.write_record(headers)?;
            for row in rows {
                writer.write_record(row)?;
            }
            let bytes = writer
                .into_inner()
                .map_err(|e| TarjumaError::Io(e.into_error()))?;
            String::from_utf8(bytes)
                .map_err(|e| TarjumaError::UnsupportedFormat(format!("non UTF-8 table output: {}", e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{DirectionPair, LanguageEntry, LanguageTable};
    use crate::router::Registration;
    use crate::translate::BackendAdapter;
    use assert_fs::prelude::*;
    use async_trait::async_trait;

    /// Wraps text in brackets; fails on "FAIL"
    struct BracketAdapter;

    #[async_trait]
    impl BackendAdapter for BracketAdapter {
        fn name(&self) -> &str {
            "Bracket"
        }

        fn pairs(&self) -> Vec<DirectionPair> {
            vec![DirectionPair::new("eng_Latn", "hin_Deva")]
        }

        fn supports(&self, source: &LanguageCode, target: &LanguageCode) -> bool {
            source.as_str() == "eng_Latn" && target.as_str() == "hin_Deva"
        }

        async fn translate(
            &self,
            text: &str,
            _source: &LanguageCode,
            _target: &LanguageCode,
        ) -> Result<String> {
            if text.contains("FAIL") {
                return Err(TarjumaError::backend("Bracket", anyhow::anyhow!("bad input")));
            }
            Ok(format!("[{}]", text))
        }
    }

    fn translator() -> FileTranslator {
        let table = LanguageTable::new(vec![
            LanguageEntry::new("eng_Latn", "English", &[]),
            LanguageEntry::new("hin_Deva", "Hindi", &[]),
        ]);
        let router = Router::builder(table, LanguageCode::new("eng_Latn"))
            .register(Registration::new(Arc::new(BracketAdapter)))
            .build()
            .unwrap();
        FileTranslator::new(Arc::new(router))
    }

    fn en() -> LanguageCode {
        LanguageCode::new("eng_Latn")
    }

    fn hi() -> LanguageCode {
        LanguageCode::new("hin_Deva")
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(FileFormat::from_path(Path::new("a/b.TXT")).unwrap(), FileFormat::Text);
        assert_eq!(FileFormat::from_path(Path::new("data.json")).unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_path(Path::new("rows.Csv")).unwrap(), FileFormat::Csv);
        assert!(matches!(
            FileFormat::from_path(Path::new("doc.pdf")),
            Err(TarjumaError::UnsupportedFormat(_))
        ));
        assert!(FileFormat::from_path(Path::new("README")).is_err());
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("/data/notes.txt"), &hi()),
            PathBuf::from("/data/notes_translated_hin_Deva.txt")
        );
        assert_eq!(
            default_output_path(Path::new("rows.csv"), &LanguageCode::new("zh")),
            PathBuf::from("rows_translated_zh.csv")
        );
    }

    #[tokio::test]
    async fn test_text_file_line_by_line() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("notes.txt");
        input.write_str("Hello\n\n  World  \n").unwrap();

        let report = translator()
            .translate_file(input.path(), None, &en(), &hi(), &FileOptions::default())
            .await
            .unwrap();

        assert_eq!(report.output, temp.path().join("notes_translated_hin_Deva.txt"));
        assert_eq!(report.format, FileFormat::Text);
        assert_eq!(report.stats.succeeded, 2);
        let written = std::fs::read_to_string(&report.output).unwrap();
        assert_eq!(written, "[Hello]\n\n[World]\n");
    }

    #[tokio::test]
    async fn test_text_file_keeps_line_endings_and_blank_lines() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("crlf.txt");
        input.write_str("a\r\n\r\nb\n").unwrap();

        let report = translator()
            .translate_file(input.path(), None, &en(), &hi(), &FileOptions::default())
            .await
            .unwrap();

        assert_eq!(report.stats.succeeded, 2);
        let written = std::fs::read_to_string(&report.output).unwrap();
        assert_eq!(written, "[a]\n\r\n[b]\n");
    }

    #[tokio::test]
    async fn test_forced_format_overrides_extension() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("export.data");
        input.write_str(r#"{"title": "Hi"}"#).unwrap();

        let err = translator()
            .translate_file(input.path(), None, &en(), &hi(), &FileOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TarjumaError::UnsupportedFormat(_)));

        let options = FileOptions {
            format: Some(FileFormat::Json),
            ..FileOptions::default()
        };
        let report = translator()
            .translate_file(input.path(), None, &en(), &hi(), &options)
            .await
            .unwrap();

        assert_eq!(report.format, FileFormat::Json);
        assert_eq!(report.output, temp.path().join("export_translated_hin_Deva.data"));
        let written = std::fs::read_to_string(&report.output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["title"], "[Hi]");
    }

    #[test]
    fn test_format_names() {
        assert_eq!("JSON".parse::<FileFormat>().unwrap(), FileFormat::Json);
        assert_eq!("text".parse::<FileFormat>().unwrap(), FileFormat::Text);
        assert_eq!("txt".parse::<FileFormat>().unwrap(), FileFormat::Text);
        assert!(matches!("xml".parse::<FileFormat>(), Err(TarjumaError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_json_fields_and_unicode_output() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("data.json");
        input
            .write_str(r#"{"title": "Hi", "id": "x1", "nested": {"title": "नमस्ते"}}"#)
            .unwrap();
        let output = temp.child("out/data.json");

        let options = FileOptions {
            fields: Some(vec!["title".to_string()]),
            ..FileOptions::default()
        };
        translator()
            .translate_file(input.path(), Some(output.path()), &en(), &hi(), &options)
            .await
            .unwrap();

        let written = std::fs::read_to_string(output.path()).unwrap();
        assert!(written.contains("[नमस्ते]"));
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["title"], "[Hi]");
        assert_eq!(value["id"], "x1");
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["title", "id", "nested"]);
    }

    #[tokio::test]
    async fn test_csv_columns_and_cell_failures() {
        let temp = assert_fs::TempDir::new().unwrap();
        let input = temp.child("rows.csv");
        input
            .write_str("id,text\n1,one\n2,FAIL\n3,\"three, four\"\n")
            .unwrap();

        let options = FileOptions {
            columns: Some(vec!["text".to_string()]),
            ..FileOptions::default()
        };
        let report = translator()
            .translate_file(input.path(), None, &en(), &hi(), &options)
            .await
            .unwrap();

        assert_eq!(report.stats.succeeded, 2);
        assert_eq!(report.stats.failed, 1);
        let written = std::fs::read_to_string(&report.output).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["id,text", "1,[one]", "2,FAIL", "3,\"[three, four]\""]);
    }

    #[tokio::test]
    async fn test_missing_and_unsupported_inputs() {
        let temp = assert_fs::TempDir::new().unwrap();
        let translator = translator();
        let options = FileOptions::default();

        let err = translator
            .translate_file(&temp.path().join("nope.txt"), None, &en(), &hi(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, TarjumaError::FileNotFound(_)));

        let doc = temp.child("doc.pdf");
        doc.write_str("binary").unwrap();
        let err = translator
            .translate_file(doc.path(), None, &en(), &hi(), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, TarjumaError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn test_directory_mirrors_tree_and_skips_failures() {
        let input = assert_fs::TempDir::new().unwrap();
        let output = assert_fs::TempDir::new().unwrap();
        input.child("a.txt").write_str("alpha").unwrap();
        input.child("sub/b.json").write_str(r#"{"k": "beta"}"#).unwrap();
        input.child("sub/broken.json").write_str("{ not json").unwrap();
        input.child("skip.md").write_str("ignored").unwrap();

        let report = translator()
            .translate_directory(input.path(), Some(output.path()), &en(), &hi(), &FileOptions::default())
            .await
            .unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].0.ends_with("broken.json"));
        let alpha = std::fs::read_to_string(output.path().join("a_translated_hin_Deva.txt")).unwrap();
        assert_eq!(alpha, "[alpha]");
        let beta = std::fs::read_to_string(output.path().join("sub/b_translated_hin_Deva.json")).unwrap();
        assert!(beta.contains("[beta]"));
    }

    #[tokio::test]
    async fn test_directory_rerun_skips_earlier_outputs() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("a.txt").write_str("alpha").unwrap();
        dir.child("a_translated_hin_Deva.txt").write_str("[alpha]").unwrap();
        dir.child("b_translated_zh.txt").write_str("beta").unwrap();

        let report = translator()
            .translate_directory(dir.path(), None, &en(), &hi(), &FileOptions::default())
            .await
            .unwrap();

        let inputs: Vec<PathBuf> = report.files.iter().map(|f| f.input.clone()).collect();
        assert_eq!(inputs, vec![dir.path().join("a.txt"), dir.path().join("b_translated_zh.txt")]);
        assert!(report.failed.is_empty());
        assert!(!dir.path().join("a_translated_hin_Deva_translated_hin_Deva.txt").exists());
        let alpha = std::fs::read_to_string(dir.path().join("a_translated_hin_Deva.txt")).unwrap();
        assert_eq!(alpha, "[alpha]");
    }
}
