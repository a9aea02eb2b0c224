//! MSVC toolchain environment.

use std::collections::BTreeMap;

use anyhow::Result;

use super::ToolchainEnv;
use crate::core::errors::RecipeError;

/// Tool variables that make configure drive cl.exe and friends.
pub fn tool_env() -> ToolchainEnv {
    [
        ("CC", "cl -nologo"),
        ("CXX", "cl -nologo"),
        ("LD", "link -nologo"),
        ("LDFLAGS", ""),
        ("NM", "dumpbin -symbols"),
        ("STRIP", ":"),
        ("AR", "lib -nologo"),
        ("RANLIB", ":"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// vcvarsall.bat architecture argument for a target arch.
pub fn vcvars_arch(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("x64"),
        "x86" => Some("x86"),
        "armv8" | "aarch64" => Some("arm64"),
        "armv7" => Some("arm"),
        _ => None,
    }
}

/// Variables of the MSVC environment that the build needs.
const IMPORTANT_VARS: &[&str] = &[
    "PATH",
    "INCLUDE",
    "LIB",
    "LIBPATH",
    "VCINSTALLDIR",
    "VSCMD_ARG_TGT_ARCH",
];

/// Parse the output of `set` into a variable map, keys uppercased.
pub fn parse_set_output(output: &str) -> BTreeMap<String, String> {
    let mut env_vars = BTreeMap::new();
    for line in output.lines() {
        if let Some((key, value)) = line.split_once('=') {
            if !key.is_empty() {
                env_vars.insert(key.to_uppercase(), value.to_string());
            }
        }
    }
    env_vars
}

/// Keep only the variables the build needs.
pub fn filter_important(env_vars: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    IMPORTANT_VARS
        .iter()
        .filter_map(|&key| env_vars.get(key).map(|v| (key.to_string(), v.clone())))
        .collect()
}

/// Capture the MSVC compiler environment for `arch`.
///
/// When `VCINSTALLDIR` is already set, the caller ran vcvars and the current
/// environment is used as is (empty overlay).
pub fn vcvars_environment(arch: &str) -> Result<BTreeMap<String, String>> {
    if std::env::var_os("VCINSTALLDIR").is_some() {
        tracing::debug!("MSVC environment already active");
        return Ok(BTreeMap::new());
    }
    capture_vcvars(arch)
}

#[cfg(not(target_os = "windows"))]
fn capture_vcvars(_arch: &str) -> Result<BTreeMap<String, String>> {
    Err(RecipeError::MissingPrerequisite {
        tool: "vcvarsall.bat".to_string(),
        hint: "MSVC builds must run on a Windows host with Visual Studio installed".to_string(),
    }
    .into())
}

/// Run vcvarsall.bat (located through vswhere.exe) and capture its environment.
#[cfg(target_os = "windows")]
fn capture_vcvars(arch: &str) -> Result<BTreeMap<String, String>> {
    use std::path::PathBuf;
    use std::process::Command;

    let missing = |hint: &str| -> anyhow::Error {
        RecipeError::MissingPrerequisite {
            tool: "vcvarsall.bat".to_string(),
            hint: hint.to_string(),
        }
        .into()
    };

    let vcvars_arch = vcvars_arch(arch)
        .ok_or_else(|| missing(&format!("no MSVC environment for architecture `{}`", arch)))?;

    let program_files = std::env::var("ProgramFiles(x86)")
        .unwrap_or_else(|_| r"C:\Program Files (x86)".to_string());
    let vswhere = PathBuf::from(program_files)
        .join("Microsoft Visual Studio")
        .join("Installer")
        .join("vswhere.exe");
    if !vswhere.exists() {
        return Err(missing("vswhere.exe not found; install Visual Studio Build Tools"));
    }

    let output = Command::new(&vswhere)
        .args([
            "-latest",
            "-requires",
            "Microsoft.VisualStudio.Component.VC.Tools.x86.x64",
            "-property",
            "installationPath",
            "-format",
            "value",
        ])
        .output()?;
    let vs_path = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if !output.status.success() || vs_path.is_empty() {
        return Err(missing("no Visual Studio installation with C++ tools found"));
    }

    let vcvarsall = PathBuf::from(vs_path)
        .join("VC")
        .join("Auxiliary")
        .join("Build")
        .join("vcvarsall.bat");
    if !vcvarsall.exists() {
        return Err(missing(&format!("not found at {}", vcvarsall.display())));
    }

    tracing::info!("Loading MSVC environment via {}", vcvarsall.display());

    // A temporary batch file sidesteps cmd.exe quoting rules
    let batch = tempfile::Builder::new()
        .prefix("ncurses_vcvars")
        .suffix(".bat")
        .tempfile()?;
    std::fs::write(
        batch.path(),
        format!(
            "@echo off\r\ncall \"{}\" {} >nul 2>&1\r\nif errorlevel 1 exit /b 1\r\nset\r\n",
            vcvarsall.display(),
            vcvars_arch
        ),
    )?;

    let output = Command::new("cmd").arg("/c").arg(batch.path()).output()?;
    if !output.status.success() {
        return Err(missing("vcvarsall.bat failed"));
    }

    let captured = filter_important(&parse_set_output(&String::from_utf8_lossy(&output.stdout)));
    if captured.get("PATH").map_or(true, |p| p.is_empty()) {
        return Err(missing("vcvarsall.bat produced an empty PATH"));
    }

    Ok(captured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_env() {
        let env = tool_env();
        assert_eq!(env.iter().count(), 8);
        assert_eq!(env.get("CC"), Some("cl -nologo"));
        assert_eq!(env.get("CXX"), Some("cl -nologo"));
        assert_eq!(env.get("LD"), Some("link -nologo"));
        assert_eq!(env.get("LDFLAGS"), Some(""));
        assert_eq!(env.get("NM"), Some("dumpbin -symbols"));
        assert_eq!(env.get("STRIP"), Some(":"));
        assert_eq!(env.get("RANLIB"), Some(":"));
    }

    #[test]
    fn test_vcvars_arch() {
        assert_eq!(vcvars_arch("x86_64"), Some("x64"));
        assert_eq!(vcvars_arch("armv8"), Some("arm64"));
        assert_eq!(vcvars_arch("sparc"), None);
    }

    #[test]
    fn test_parse_and_filter_set_output() {
        let output = "Path=C:\\VC\\bin;C:\\Windows\r\nINCLUDE=C:\\VC\\include\r\nPROMPT=$P$G\r\n=C:=C:\\\r\n";
        let vars = parse_set_output(output);
        assert_eq!(vars.get("PATH").map(|s| s.as_str()), Some("C:\\VC\\bin;C:\\Windows"));

        let important = filter_important(&vars);
        assert_eq!(important.len(), 2);
        assert!(important.contains_key("INCLUDE"));
        assert!(!important.contains_key("PROMPT"));
    }
}
