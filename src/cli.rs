use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::files::FileFormat;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a piece of text
    Text {
        /// Text to translate
        text: String,

        /// Source language (code or alias, e.g. eng_Latn, en, hindi)
        #[arg(short, long)]
        src: String,

        /// Target language (code or alias)
        #[arg(short, long)]
        tgt: String,

        /// Translate via the pivot language when no direct pair exists
        #[arg(short, long)]
        multi_step: bool,
    },

    /// Translate a .txt, .json or .csv file
    File {
        /// Input file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (defaults to <stem>_translated_<tgt><ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source language (code or alias)
        #[arg(short, long)]
        src: String,

        /// Target language (code or alias)
        #[arg(short, long)]
        tgt: String,

        /// Translate via the pivot language when no direct pair exists
        #[arg(short, long)]
        multi_step: bool,

        /// JSON fields to translate (all string fields if not provided)
        #[arg(long, num_args = 1..)]
        fields: Option<Vec<String>>,

        /// CSV columns to translate (all columns if not provided)
        #[arg(long, num_args = 1..)]
        columns: Option<Vec<String>>,

        /// Treat the input as txt, json or csv regardless of its extension
        #[arg(long, value_name = "TYPE")]
        file_type: Option<FileFormat>,
    },

    /// Translate every supported file in a directory tree
    Batch {
        /// Input directory
        #[arg(short, long)]
        input_dir: PathBuf,

        /// Output directory (defaults to the input directory)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Source language (code or alias)
        #[arg(short, long)]
        src: String,

        /// Target language (code or alias)
        #[arg(short, long)]
        tgt: String,

        /// Translate via the pivot language when no direct pair exists
        #[arg(short, long)]
        multi_step: bool,

        /// JSON fields to translate
        #[arg(long, num_args = 1..)]
        fields: Option<Vec<String>>,

        /// CSV columns to translate
        #[arg(long, num_args = 1..)]
        columns: Option<Vec<String>>,
    },

    /// Start the interactive prompt
    Interactive,

    /// List languages and available targets
    Languages {
        /// Only show targets reachable from this language
        #[arg(short, long)]
        src: Option<String>,

        /// Include targets reachable via the pivot language
        #[arg(short, long)]
        multi_step: bool,
    },

    /// Show backends, their pairs and configured models
    Info,

    /// Check that the model server is reachable
    Check,
}
