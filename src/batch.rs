//! Structured-document traversal.
//!
//! Applies one routed translation to every eligible leaf of a document,
//! serially and in document order.

use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::Result;
use crate::language::LanguageCode;
use crate::router::{RouteMode, Router};

/// A document to translate
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// Flat sequence of strings (text file lines)
    Lines(Vec<String>),
    /// Nested tree of objects, arrays and scalars
    Tree(Value),
    /// Rows of cells under named columns
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

/// A leaf that failed but was kept in its original form
#[derive(Debug, Clone, Serialize)]
pub struct LeafFailure {
    pub location: String,
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchStats {
    /// Leaves sent to the router
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failures: Vec<LeafFailure>,
    pub elapsed: Duration,
}

struct Traversal<'a> {
    router: &'a Router,
    source: &'a LanguageCode,
    target: &'a LanguageCode,
    mode: RouteMode,
    filter: Option<&'a [String]>,
}

impl Traversal<'_> {
    fn wants(&self, name: &str) -> bool {
        self.filter
            .map(|names| names.iter().any(|n| n == name))
            .unwrap_or(true)
    }

    async fn translate(&self, text: &str, stats: &mut BatchStats) -> Result<String> {
        stats.attempted += 1;
        let result = self
            .router
            .translate_with(self.mode, text, self.source, self.target)
            .await?;
        stats.succeeded += 1;
        Ok(result)
    }

    async fn lines(&self, lines: Vec<String>, stats: &mut BatchStats) -> Result<Vec<String>> {
        let mut translated = Vec::with_capacity(lines.len());
        for (index, line) in lines.into_iter().enumerate() {
            let text = line.trim();
            if text.is_empty() {
                translated.push(line);
                continue;
            }
            debug!("Translating line {}", index + 1);
            translated.push(self.translate(text, stats).await?);
        }
        Ok(translated)
    }

    fn tree<'b>(
        &'b self,
        value: &'b mut Value,
        path: String,
        stats: &'b mut BatchStats,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'b>> {
        Box::pin(async move {
            match value {
                Value::Object(map) => {
                    for (key, child) in map.iter_mut() {
                        let child_path = format!("{}.{}", path, key);
                        match child {
                            Value::String(text) => {
                                if !text.trim().is_empty() && self.wants(key) {
                                    debug!("Translating field {}", child_path);
                                    let translated = self.translate(text, stats).await?;
                                    *text = translated;
                                }
                            }
                            Value::Object(_) | Value::Array(_) => {
                                self.tree(child, child_path, stats).await?;
                            }
                            _ => {}
                        }
                    }
                }
                Value::Array(items) => {
                    // Only containers are visited; bare strings in arrays are left as-is
                    for (index, item) in items.iter_mut().enumerate() {
                        if item.is_object() || item.is_array() {
                            self.tree(item, format!("{}[{}]", path, index), stats).await?;
                        }
                    }
                }
                _ => {}
            }
            Ok(())
        })
    }

    async fn table(
        &self,
        headers: &[String],
        rows: &mut [Vec<String>],
        stats: &mut BatchStats,
    ) {
        let columns: Vec<usize> = headers
            .iter()
            .enumerate()
            .filter(|(_, name)| self.wants(name))
            .map(|(index, _)| index)
            .collect();

        for (row_index, row) in rows.iter_mut().enumerate() {
            for &column in &columns {
                let Some(cell) = row.get_mut(column) else {
                    continue;
                };
                if cell.trim().is_empty() {
                    continue;
                }

                let result = self.translate(cell, stats).await;
                match result {
                    Ok(text) => *cell = text,
                    Err(e) => {
                        let location = format!("row {}, column {}", row_index + 1, headers[column]);
                        warn!("Failed to translate {}: {}", location, e);
                        stats.failed += 1;
                        stats.failures.push(LeafFailure {
                            location,
                            kind: e.kind().to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
    }
}

/// Translate every eligible leaf of `document`.
///
/// `filter` names the object keys (trees) or columns (tables) to translate;
/// `None` means all. Lines and trees fail on the first error; tables keep the
/// original cell, record the failure and continue.
pub async fn traverse(
    router: &Router,
    document: Document,
    source: &LanguageCode,
    target: &LanguageCode,
    mode: RouteMode,
    filter: Option<&[String]>,
) -> Result<(Document, BatchStats)> {
    let traversal = Traversal {
        router,
        source,
        target,
        mode,
        filter,
    };
    let mut stats = BatchStats::default();
    let start = Instant::now();

    let document = match document {
        Document::Lines(lines) => Document::Lines(traversal.lines(lines, &mut stats).await?),
        Document::Tree(mut value) => {
            traversal.tree(&mut value, "$".to_string(), &mut stats).await?;
            Document::Tree(value)
        }
        Document::Table { headers, mut rows } => {
            traversal.table(&headers, &mut rows, &mut stats).await;
            Document::Table { headers, rows }
        }
    };

    stats.elapsed = start.elapsed();
    Ok((document, stats))
}
