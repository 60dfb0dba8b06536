use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "varlint",
    version,
    about = "Check Terraform variable declarations against an interface specification catalog"
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Specification catalog (TOML). Defaults to `.varlint.toml` in the checked directory
    #[arg(long, short, global = true, env = "VARLINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// More logging on stderr (-v debug, -vv trace)
    #[arg(long, short, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Check the variable declarations of a module
    Check {
        /// Module directory
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Also load every nested directory holding .tf files
        #[arg(long, short)]
        recursive: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = Format::Human)]
        format: Format,
    },

    /// Print declarations that satisfy the catalog
    Stub {
        /// Only these variables (default: every specification)
        names: Vec<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Format {
    /// Annotated source snippets
    Human,
    /// A JSON array of issues
    Json,
}
