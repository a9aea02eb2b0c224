//! `ncurses-recipe build` command

use anyhow::Result;

use super::RecipeContext;
use crate::cli::{BuildArgs, RecipeArgs};
use ncurses_recipe::ops::{build, BuildPlan, BuildRequest};

pub fn execute(recipe: &RecipeArgs, args: BuildArgs) -> Result<()> {
    let mut ctx = RecipeContext::load(recipe)?;

    // CLI overrides config
    if args.jobs.is_some() {
        ctx.tool_config.build.jobs = args.jobs;
    }
    if args.offline {
        ctx.tool_config.net.offline = true;
    }

    if args.dry_run {
        let plan = BuildPlan::new(&ctx.config, &ctx.paths, &ctx.tool_config);
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let outcome = build(BuildRequest {
        config: &ctx.config,
        paths: &ctx.paths,
        data: &ctx.data,
        tool_config: &ctx.tool_config,
        fresh_source: args.fresh,
    })?;

    eprintln!("    Finished ncurses {} ({})", ctx.config.version, ctx.config.policy);
    eprintln!("     Package {}", ctx.paths.package_dir.display());
    eprintln!("        Info {}", outcome.info_path.display());
    eprintln!("       Files {}", outcome.files.len());

    Ok(())
}
