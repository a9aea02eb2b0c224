//! Command implementations

pub mod args;
pub mod build;
pub mod completions;
pub mod info;
pub mod options;
pub mod requirements;

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::RecipeArgs;
use ncurses_recipe::core::profile::Profile;
use ncurses_recipe::core::recipe::{RecipeConfig, RecipePaths};
use ncurses_recipe::ops::recipe_build::default_work_dir;
use ncurses_recipe::sources::RecipeData;
use ncurses_recipe::util::config::{global_config_path, load_config, project_config_path};
use ncurses_recipe::util::Config;

/// Everything a command needs, resolved from the command line, the profile
/// and the config files.
pub struct RecipeContext {
    pub config: RecipeConfig,
    pub paths: RecipePaths,
    pub data: RecipeData,
    pub tool_config: Config,
}

impl RecipeContext {
    pub fn load(args: &RecipeArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let tool_config = load_config(global_config_path().as_deref(), &project_config_path(&cwd));

        let data = match &args.data {
            Some(path) => RecipeData::load(path)?,
            None => RecipeData::bundled()?,
        };

        let profile = match &args.profile {
            Some(path) => Profile::load(path)?,
            None => Profile::default(),
        }
        .with_overrides(&args.options, &args.settings)?;

        let platform = profile.platform()?;
        let options = profile.options(&platform)?;

        let version = match &args.version {
            Some(v) => v.clone(),
            None => data
                .latest_version()
                .context("recipe data lists no ncurses versions")?
                .to_string(),
        };

        let config = RecipeConfig::new(version, options, platform);
        tracing::debug!("resolved {} for {}", config.options, config.platform);

        let work_dir: PathBuf = match args.work_dir.clone().or_else(|| tool_config.build.work_dir.clone()) {
            Some(dir) => dir,
            None => default_work_dir(&cwd.join(".ncurses-recipe").join("work"), &config),
        };
        let paths = RecipePaths::under(&work_dir);

        Ok(RecipeContext {
            config,
            paths,
            data,
            tool_config,
        })
    }
}
