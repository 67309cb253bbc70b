//! Create or refresh a root `compile_commands.json` that points at the build
//! directory of a CMake configure preset.
//!
//! Usage: sync-compile-commands --preset linux-clang-debug [--mode auto]

mod link;
mod presets;

use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::link::{LinkMode, Method};

const TAG: &str = "[sync-compile-commands]";

#[derive(Debug, Parser)]
#[command(
    name = "sync-compile-commands",
    version,
    about = "Create/refresh a root compile_commands.json link to the selected CMake preset build directory."
)]
struct Args {
    /// configurePreset name, e.g. linux-clang-debug
    #[arg(long)]
    preset: String,
    /// Project root
    #[arg(long, default_value = ".")]
    source_dir: PathBuf,
    /// Path to CMakePresets.json, relative to the project root
    #[arg(long, default_value = "CMakePresets.json")]
    presets: PathBuf,
    /// Link mode preference
    #[arg(long, value_enum, default_value_t = LinkMode::Auto)]
    mode: LinkMode,
}

#[derive(Debug)]
struct Synced {
    source: PathBuf,
    dest: PathBuf,
    method: Method,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    match sync(&args) {
        Ok(synced) => {
            report(&synced);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{TAG} {e:#}");
            ExitCode::from(1)
        }
    }
}

fn sync(args: &Args) -> Result<Synced> {
    let source_dir = fs::canonicalize(&args.source_dir)
        .with_context(|| format!("Project root not found: {}", args.source_dir.display()))?;
    let presets_path = source_dir.join(&args.presets);
    if !presets_path.exists() {
        bail!("CMakePresets.json not found: {}", presets_path.display());
    }

    let doc = presets::load(&presets_path)?;
    let preset = presets::resolve(&doc, &args.preset)?;
    let template = preset
        .get("binaryDir")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .with_context(|| format!("Preset '{}' has no binaryDir", args.preset))?;

    let build_dir = presets::resolve_binary_dir(template, &source_dir, &args.preset, presets::host_system_name());
    let source = build_dir.join("compile_commands.json");
    if !source.exists() {
        bail!(
            "compile_commands.json not found at:\n  {}\n\
             Did you configure/build this preset first?\n\
             Example:\n  cmake --preset {}",
            source.display(),
            args.preset
        );
    }
    info!(preset = %args.preset, build_dir = %build_dir.display(), "resolved build directory");

    let dest = source_dir.join("compile_commands.json");
    link::remove_existing(&dest)?;

    let methods = link::strategy(args.mode, cfg!(windows));
    let outcome = link::link(&source, &dest, &methods)?;
    info!(attempted = outcome.attempted.len(), method = %outcome.method, "linked");

    Ok(Synced {
        source,
        dest,
        method: outcome.method,
    })
}

fn report(synced: &Synced) {
    match fs::read_link(&synced.dest) {
        Ok(target) => println!(
            "{TAG} OK: symlink {} -> {}",
            synced.dest.display(),
            target.display()
        ),
        Err(_) => println!(
            "{TAG} OK: created {} (mode={})",
            synced.dest.display(),
            synced.method
        ),
    }
    println!("{TAG} Source: {}", synced.source.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::Path;

    fn project(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sync-cc-{}-{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("CMakePresets.json"),
            r#"{
                "version": 6,
                "configurePresets": [
                    { "name": "base", "hidden": true, "binaryDir": "${sourceDir}/build/${presetName}" },
                    { "name": "dbg", "inherits": "base" },
                    { "name": "nodir" }
                ]
            }"#,
        )
        .unwrap();
        dir
    }

    fn args(dir: &Path, preset: &str, mode: LinkMode) -> Args {
        Args {
            preset: preset.to_string(),
            source_dir: dir.to_path_buf(),
            presets: PathBuf::from("CMakePresets.json"),
            mode,
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn copies_and_replaces_existing() {
        let dir = project("copy");
        fs::create_dir_all(dir.join("build/dbg")).unwrap();
        fs::write(dir.join("build/dbg/compile_commands.json"), "[1]").unwrap();
        fs::write(dir.join("compile_commands.json"), "stale").unwrap();

        let synced = sync(&args(&dir, "dbg", LinkMode::Copy)).unwrap();
        assert_eq!(synced.method, Method::Copy);
        assert_eq!(fs::read_to_string(dir.join("compile_commands.json")).unwrap(), "[1]");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_build_output_explains_next_step() {
        let dir = project("missing");
        let err = sync(&args(&dir, "dbg", LinkMode::Auto)).unwrap_err();
        let text = format!("{err:#}");
        assert!(text.contains("cmake --preset dbg"), "{text}");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn relative_binary_dir_links_from_source_dir() {
        let dir = project("relative");
        fs::write(
            dir.join("CMakePresets.json"),
            r#"{ "version": 6, "configurePresets": [ { "name": "dbg", "binaryDir": "build/${presetName}" } ] }"#,
        )
        .unwrap();
        fs::create_dir_all(dir.join("build/dbg")).unwrap();
        fs::write(dir.join("build/dbg/compile_commands.json"), "[2]").unwrap();
        assert_ne!(std::env::current_dir().unwrap(), dir);

        let synced = sync(&args(&dir, "dbg", LinkMode::Symlink)).unwrap();
        assert_eq!(synced.method, Method::Symlink);
        assert!(synced.source.is_absolute());
        let dest = dir.join("compile_commands.json");
        assert_eq!(fs::read_link(&dest).unwrap(), PathBuf::from("build/dbg/compile_commands.json"));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "[2]");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn preset_without_binary_dir() {
        let dir = project("nodir");
        let err = sync(&args(&dir, "nodir", LinkMode::Auto)).unwrap_err();
        assert!(err.to_string().contains("has no binaryDir"), "{err}");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_presets_file() {
        let dir = project("nopresets");
        fs::remove_file(dir.join("CMakePresets.json")).unwrap();
        let err = sync(&args(&dir, "dbg", LinkMode::Auto)).unwrap_err();
        assert!(err.to_string().contains("CMakePresets.json not found"), "{err}");
        fs::remove_dir_all(&dir).unwrap();
    }
}
