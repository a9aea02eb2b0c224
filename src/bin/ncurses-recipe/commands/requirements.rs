//! `ncurses-recipe requirements` command

use anyhow::Result;

use super::RecipeContext;
use crate::cli::{RecipeArgs, RequirementsArgs};
use ncurses_recipe::core::requirements::{build_requirements, requirements, HostInfo};

pub fn execute(recipe: &RecipeArgs, args: RequirementsArgs) -> Result<()> {
    let ctx = RecipeContext::load(recipe)?;

    let reqs = requirements(&ctx.config);
    if reqs.is_empty() {
        eprintln!("No requirements");
    }
    for req in &reqs {
        println!("{}", req);
    }

    if args.build {
        let host = HostInfo::detect(ctx.tool_config.toolchain.bash.is_some());
        for req in build_requirements(&host) {
            println!("{} (build)", req);
        }
    }

    Ok(())
}
