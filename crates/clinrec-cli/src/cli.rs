//! CLI argument definitions for `clinrec`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "clinrec",
    version,
    about = "Rebuild nested clinical records from flattened rows",
    long_about = "Rebuild nested clinical records from flattened row data.\n\n\
                  Rows are grouped by record, hydrated against a record schema,\n\
                  filtered by search predicates and translated into bound vocabularies."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Allow clinical values in log output.
    #[arg(long = "log-data", global = true)]
    pub log_data: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Hydrate every record in a CSV row file.
    Hydrate(HydrateArgs),

    /// Check whether a code belongs to a vocabulary set.
    CheckCode(CheckCodeArgs),

    /// Translate a code into a target vocabulary.
    Translate(TranslateArgs),
}

#[derive(Args)]
pub struct ConfigArg {
    /// Path to clinrec.toml.
    #[arg(long = "config", value_name = "PATH", default_value = "clinrec.toml")]
    pub config: PathBuf,
}

#[derive(Args)]
pub struct HydrateArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// CSV file with the reserved metadata columns and attribute columns.
    #[arg(long = "rows", value_name = "CSV")]
    pub rows: PathBuf,

    /// Record type to hydrate (e.g. Patient).
    #[arg(long = "type", value_name = "RECORD_TYPE")]
    pub record_type: String,

    /// Search predicate as code[:modifier]=value; repeat for more.
    #[arg(long = "where", value_name = "PREDICATE")]
    pub predicates: Vec<String>,

    /// Write kept documents here instead of stdout.
    #[arg(long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct CheckCodeArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Vocabulary set identifier.
    #[arg(long = "vocabulary", value_name = "URL")]
    pub vocabulary: String,

    /// Code as system|code, |code or code.
    #[arg(long = "code")]
    pub code: String,
}

#[derive(Args)]
pub struct TranslateArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Target vocabulary identifier.
    #[arg(long = "vocabulary", value_name = "URL")]
    pub vocabulary: String,

    /// Source code as system|code or code.
    #[arg(long = "code")]
    pub code: String,

    /// Treat the code as a bare code leaf, enabling wildcard fallback.
    #[arg(long = "bare")]
    pub bare: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
