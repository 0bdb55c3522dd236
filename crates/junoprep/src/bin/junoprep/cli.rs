//! junoprep cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; junoprep ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Preprocess a flat configuration
    ///
    /// Reads from stdin unless a file is given (via --input-file)
    #[command(alias = "pp")]
    Preprocess(PreprocessCommand),

    /// Print debug information for development
    Dev(DevCommand),
}

#[derive(Parser, Debug)]
pub struct PreprocessCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub output: OutputArgs,

    #[clap(flatten)]
    pub options: OptionArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load a file instead of reading stdin
    #[clap(short = 'f', long = "input-file")]
    pub file: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct OptionArgs {
    /// Give up group inheritance after this many passes
    #[arg(long = "max-passes", default_value_t = 64)]
    pub max_passes: usize,

    /// Keep apply-path directives unexpanded
    #[arg(long = "no-apply-path")]
    pub no_apply_path: bool,

    /// Keep wildcards written outside of groups
    #[arg(long = "no-wildcards")]
    pub no_wildcards: bool,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    /// set lines, issues go to stderr
    #[default]
    Set,
    Json,
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Set => f.write_str("set"),
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}

#[derive(Parser, Debug)]
pub struct DevCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[command(subcommand)]
    pub command: DevSubCommand,
}

#[derive(Subcommand, Debug)]
pub enum DevSubCommand {
    /// Lines as read, before any preprocessing
    Lines,
    /// Tree after preprocessing as set lines
    Tree {
        /// Show the tree of this group instead of the master tree
        #[arg(long, conflicts_with("deactivated"))]
        group: Option<String>,

        /// Show the deactivation tree instead of the master tree
        #[arg(long)]
        deactivated: bool,
    },
}
