//! `ncurses-recipe args` command
//!
//! Shows what `build` would pass to configure, without building.

use anyhow::Result;

use super::RecipeContext;
use crate::cli::{ArgsArgs, RecipeArgs};
use ncurses_recipe::ops::BuildPlan;

pub fn execute(recipe: &RecipeArgs, args: ArgsArgs) -> Result<()> {
    let ctx = RecipeContext::load(recipe)?;
    let plan = BuildPlan::new(&ctx.config, &ctx.paths, &ctx.tool_config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    println!("Configure arguments:");
    for arg in plan.configure_args.iter() {
        println!("  {}", arg);
    }

    println!();
    println!("Compiler flags:");
    for (key, value) in plan.compiler_flags.to_env() {
        println!("  {}={}", key, value);
    }

    if !plan.toolchain_env.is_empty() {
        println!();
        println!("Toolchain environment:");
        for (key, value) in plan.toolchain_env.iter() {
            println!("  {}={}", key, value);
        }
    }

    Ok(())
}
