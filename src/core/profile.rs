//! Build profiles.
//!
//! A profile is a TOML file fixing options and settings for a build:
//!
//! ```toml
//! [options]
//! shared = true
//! with_cxx = false
//!
//! [settings]
//! os = "Windows"
//! compiler = "msvc"
//! arch = "x86_64"
//! ```
//!
//! Command-line `-o`/`-s` assignments are applied on top of it.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::options::OptionSet;
use crate::core::platform::PlatformDescriptor;

/// Options and settings read from a profile file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub options: BTreeMap<String, toml::Value>,
    pub settings: BTreeMap<String, String>,
}

impl Profile {
    /// Load a profile from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read profile: {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("failed to parse profile: {}", path.display()))
    }

    /// Parse a profile from TOML.
    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Add `name=value` assignments from the command line.
    pub fn with_overrides(mut self, options: &[String], settings: &[String]) -> Result<Self> {
        for assignment in options {
            let (name, value) = split_assignment(assignment)?;
            self.options
                .insert(name.to_string(), toml::Value::String(value.to_string()));
        }
        for assignment in settings {
            let (name, value) = split_assignment(assignment)?;
            self.settings.insert(name.to_string(), value.to_string());
        }
        Ok(self)
    }

    /// Produce the platform: host defaults, then the profile's settings.
    ///
    /// Changing `os` without naming a compiler picks that OS's usual one.
    pub fn platform(&self) -> Result<PlatformDescriptor> {
        let mut platform = PlatformDescriptor::host();
        if let Some(os) = self.settings.get("os") {
            platform.set("os", os)?;
            if !self.settings.contains_key("compiler") {
                platform.compiler = crate::core::platform::Compiler::host_default(platform.os);
            }
        }
        for (name, value) in &self.settings {
            if name != "os" {
                platform.set(name, value)?;
            }
        }
        Ok(platform)
    }

    /// Produce the option set: declared defaults for `platform`, then the
    /// profile's options.
    pub fn options(&self, platform: &PlatformDescriptor) -> Result<OptionSet> {
        let mut options = OptionSet::declare(platform);
        for (name, value) in &self.options {
            let text = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Integer(i) => i.to_string(),
                other => other.to_string(),
            };
            options.set(name, &text)?;
        }
        Ok(options)
    }
}

fn split_assignment(assignment: &str) -> Result<(&str, &str)> {
    let (name, value) = assignment
        .split_once('=')
        .with_context(|| format!("expected `name=value`, got `{}`", assignment))?;
    Ok((name.trim(), value.trim()))
}
