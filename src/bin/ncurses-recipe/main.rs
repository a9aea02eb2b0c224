//! ncurses-recipe CLI - configure, build and package ncurses

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("ncurses_recipe=debug")
    } else {
        EnvFilter::new("ncurses_recipe=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let recipe = cli.recipe;
    match cli.command {
        Commands::Options(args) => commands::options::execute(&recipe, args),
        Commands::Requirements(args) => commands::requirements::execute(&recipe, args),
        Commands::Args(args) => commands::args::execute(&recipe, args),
        Commands::Build(args) => commands::build::execute(&recipe, args),
        Commands::Info(args) => commands::info::execute(&recipe, args),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
