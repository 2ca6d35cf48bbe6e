use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::debug;

use crate::error::Result;
use crate::files::{FileFormat, FileOptions, FileTranslator};
use crate::language::LanguageCode;
use crate::router::{RouteMode, Router};

enum Flow {
    Continue,
    Quit,
}

/// Prompt loop reading commands from `input` and printing to `output`
pub struct InteractiveSession<'a, R, W> {
    router: &'a Router,
    files: &'a FileTranslator,
    preserve_lines: bool,
    lines: Lines<R>,
    output: W,
}

impl<'a, R, W> InteractiveSession<'a, R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(
        router: &'a Router,
        files: &'a FileTranslator,
        preserve_lines: bool,
        input: R,
        output: W,
    ) -> Self {
        Self {
            router,
            files,
            preserve_lines,
            lines: input.lines(),
            output,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        writeln!(self.output, "\nInteractive Translation Mode")?;
        writeln!(
            self.output,
            "Commands: 'text' to translate, 'file' for file translation, 'help' for help, 'quit' to exit"
        )?;

        loop {
            writeln!(self.output, "\n{}", "=".repeat(50))?;

            let Some(mode) = self.prompt("Mode (text/file/quit/help): ").await? else {
                break;
            };

            let flow = match mode.to_lowercase().as_str() {
                "quit" | "exit" => Flow::Quit,
                "help" => {
                    self.print_help()?;
                    Flow::Continue
                }
                "file" => self.file_round().await?,
                "text" => self.text_round().await?,
                _ => {
                    writeln!(self.output, "Invalid mode. Use 'text', 'file', 'help', or 'quit'")?;
                    Flow::Continue
                }
            };

            if let Flow::Quit = flow {
                break;
            }
        }

        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    async fn text_round(&mut self) -> Result<Flow> {
        let Some(source) = self.ask_language("Source").await? else {
            return Ok(Flow::Quit);
        };
        let Some(source) = source else {
            return Ok(Flow::Continue);
        };
        let Some(target) = self.ask_language("Target").await? else {
            return Ok(Flow::Quit);
        };
        let Some(target) = target else {
            return Ok(Flow::Continue);
        };

        let Some(text) = self.prompt("Enter text to translate: ").await? else {
            return Ok(Flow::Quit);
        };
        if text.is_empty() {
            return Ok(Flow::Continue);
        }
        if is_quit(&text) {
            return Ok(Flow::Quit);
        }

        writeln!(self.output, "Translating...")?;
        let (mode, label) = self.route_mode(&source, &target);
        match self.router.translate_with(mode, &text, &source, &target).await {
            Ok(result) => {
                let languages = self.router.languages();
                writeln!(self.output, "\nTranslation Result ({}):", label)?;
                writeln!(self.output, "Original ({}): {}", languages.display_name(&source), text)?;
                writeln!(self.output, "Translated ({}): {}", languages.display_name(&target), result)?;
            }
            Err(e) => {
                writeln!(self.output, "Translation not possible: [{}] {}", e.kind(), e)?;
            }
        }

        Ok(Flow::Continue)
    }

    async fn file_round(&mut self) -> Result<Flow> {
        writeln!(self.output, "\nFile Translation Mode")?;

        let Some(path) = self.prompt("Enter file path: ").await? else {
            return Ok(Flow::Quit);
        };
        let path = PathBuf::from(path);
        if path.as_os_str().is_empty() || !path.exists() {
            writeln!(self.output, "File not found")?;
            return Ok(Flow::Continue);
        }
        if FileFormat::from_path(&path).is_err() {
            writeln!(
                self.output,
                "Unsupported file format. Supported: {}",
                FileFormat::EXTENSIONS.join(", ")
            )?;
            return Ok(Flow::Continue);
        }

        let Some(source) = self.ask_language("Source").await? else {
            return Ok(Flow::Quit);
        };
        let Some(source) = source else {
            return Ok(Flow::Continue);
        };
        let Some(target) = self.ask_language("Target").await? else {
            return Ok(Flow::Quit);
        };
        let Some(target) = target else {
            return Ok(Flow::Continue);
        };

        let Some(output) = self
            .prompt("Output file path (press Enter for auto-generated): ")
            .await?
        else {
            return Ok(Flow::Quit);
        };
        let output = (!output.is_empty()).then(|| PathBuf::from(output));

        let (mode, _) = self.route_mode(&source, &target);
        let options = FileOptions {
            mode,
            preserve_lines: self.preserve_lines,
            ..FileOptions::default()
        };

        writeln!(self.output, "Translating file...")?;
        match self
            .files
            .translate_file(&path, output.as_deref(), &source, &target, &options)
            .await
        {
            Ok(report) => {
                writeln!(self.output, "\nFile Translation Completed!")?;
                writeln!(self.output, "Output: {}", report.output.display())?;
                writeln!(self.output, "Time: {:.2}s", report.stats.elapsed.as_secs_f64())?;
            }
            Err(e) => writeln!(self.output, "File translation error: [{}] {}", e.kind(), e)?,
        }

        Ok(Flow::Continue)
    }

    /// `None` on end of input or quit; `Some(None)` when the answer was rejected
    async fn ask_language(&mut self, role: &str) -> Result<Option<Option<LanguageCode>>> {
        let question = format!("{} language ({}): ", role, self.short_names());
        let Some(answer) = self.prompt(&question).await? else {
            return Ok(None);
        };
        if is_quit(&answer) {
            return Ok(None);
        }

        let languages = self.router.languages();
        match languages.resolve(&answer) {
            Some(code) => Ok(Some(Some(code))),
            None => {
                writeln!(self.output, "Unsupported {} language: {}", role.to_lowercase(), answer)?;
                let supported: Vec<&str> = languages.codes().map(LanguageCode::as_str).collect();
                writeln!(self.output, "Supported: {}", supported.join(", "))?;
                Ok(Some(None))
            }
        }
    }

    fn route_mode(&self, source: &LanguageCode, target: &LanguageCode) -> (RouteMode, &'static str) {
        if self.router.is_supported_pair(source, target) {
            (RouteMode::Direct, "direct")
        } else {
            (RouteMode::MultiStep, "multi-step")
        }
    }

    /// Shortest accepted spelling per language, e.g. "en/hi/ur/zh"
    fn short_names(&self) -> String {
        self.router
            .languages()
            .entries()
            .iter()
            .map(|entry| {
                std::iter::once(entry.code.as_str())
                    .chain(entry.aliases.iter().map(String::as_str))
                    .min_by_key(|name| name.chars().count())
                    .unwrap_or(entry.code.as_str())
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("/")
    }

    async fn prompt(&mut self, question: &str) -> Result<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;
        let line = self.lines.next_line().await?;
        debug!("Interactive input: {:?}", line);
        Ok(line.map(|l| l.trim().to_string()))
    }

    fn print_help(&mut self) -> Result<()> {
        writeln!(self.output, "\nSupported languages:")?;
        for entry in self.router.languages().entries() {
            let mut names = vec![entry.code.as_str().to_string()];
            names.extend(entry.aliases.iter().cloned());
            writeln!(self.output, "  {:<28} {}", names.join("/"), entry.name)?;
        }

        writeln!(self.output, "\nDirect pairs:")?;
        for pair in self.router.pairs() {
            writeln!(self.output, "  {}", pair)?;
        }
        writeln!(
            self.output,
            "\nOther pairs are translated in two steps via {}.",
            self.router.languages().display_name(self.router.pivot())
        )?;

        writeln!(self.output, "\nSupported file formats:")?;
        writeln!(self.output, "  .txt   plain text, translated line by line")?;
        writeln!(self.output, "  .json  string fields of objects")?;
        writeln!(self.output, "  .csv   every cell of the selected columns")?;
        Ok(())
    }
}

fn is_quit(answer: &str) -> bool {
    matches!(answer.to_lowercase().as_str(), "quit" | "exit")
}
