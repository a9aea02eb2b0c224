//! `ncurses-recipe options` command

use anyhow::Result;

use super::RecipeContext;
use crate::cli::{OptionsArgs, RecipeArgs};

pub fn execute(recipe: &RecipeArgs, args: OptionsArgs) -> Result<()> {
    let ctx = RecipeContext::load(recipe)?;
    let config = &ctx.config;

    if args.json {
        println!("{}", serde_json::to_string_pretty(config)?);
        return Ok(());
    }

    println!("ncurses {} ({})", config.version, config.policy);
    println!("  {}", config.platform);
    println!();
    for (name, value) in config.options.entries() {
        println!("  {:<22} {}", name, if value { "True" } else { "False" });
    }

    Ok(())
}
