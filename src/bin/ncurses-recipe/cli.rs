//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// ncurses-recipe - configure, build and package the ncurses library
#[derive(Parser)]
#[command(name = "ncurses-recipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub recipe: RecipeArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options and settings shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct RecipeArgs {
    /// Set a recipe option (e.g. `-o shared=True`)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE", global = true)]
    pub options: Vec<String>,

    /// Set a platform setting (e.g. `-s os=Windows`)
    #[arg(short = 's', long = "setting", value_name = "NAME=VALUE", global = true)]
    pub settings: Vec<String>,

    /// Profile file with [options] and [settings] tables
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    /// ncurses version to build (defaults to the newest known one)
    #[arg(id = "ncurses_version", long = "ncurses-version", value_name = "VERSION", global = true)]
    pub version: Option<String>,

    /// Recipe data file listing sources and patches
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    /// Directory holding source/, build/ and package/
    #[arg(long, global = true)]
    pub work_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the effective options after normalization
    Options(OptionsArgs),

    /// List the packages this configuration depends on
    Requirements(RequirementsArgs),

    /// Show the configure arguments, compiler flags and tool environment
    Args(ArgsArgs),

    /// Fetch, configure, build and package ncurses
    Build(BuildArgs),

    /// Show what the package exports to consumers
    Info(InfoArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct OptionsArgs {
    /// Emit JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct RequirementsArgs {
    /// Include build-time requirements of the host
    #[arg(long)]
    pub build: bool,
}

#[derive(Args)]
pub struct ArgsArgs {
    /// Emit the full build plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Re-extract sources even if a prepared tree exists
    #[arg(long)]
    pub fresh: bool,

    /// Number of parallel make jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Never download; use cached or local tarballs only
    #[arg(long)]
    pub offline: bool,

    /// Print the build plan as JSON (no build)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Args)]
pub struct InfoArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    pub format: InfoFormat,

    /// Installed package to describe (defaults to the work directory's package/)
    #[arg(long)]
    pub package_dir: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum InfoFormat {
    Text,
    Json,
    Pc,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
