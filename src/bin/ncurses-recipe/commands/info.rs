//! `ncurses-recipe info` command

use anyhow::Result;

use super::RecipeContext;
use crate::cli::{InfoArgs, InfoFormat, RecipeArgs};
use ncurses_recipe::ops::package_info::{export_info, PACKAGE_INFO_FILE};
use ncurses_recipe::ops::PackageInfo;

pub fn execute(recipe: &RecipeArgs, args: InfoArgs) -> Result<()> {
    let ctx = RecipeContext::load(recipe)?;
    let package_root = args
        .package_dir
        .clone()
        .unwrap_or_else(|| ctx.paths.package_dir.clone());

    // An installed package describes itself; otherwise derive from the config
    let info = if package_root.join(PACKAGE_INFO_FILE).is_file() {
        PackageInfo::load(&package_root)?
    } else {
        export_info(&ctx.config, &package_root)
    };

    match args.format {
        InfoFormat::Text => print!("{}", info.to_text()),
        InfoFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
        InfoFormat::Pc => print!("{}", info.to_pkg_config(&package_root)),
    }

    Ok(())
}
