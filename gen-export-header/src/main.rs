//! Generate per-library C export headers.
//!
//! Every library gets the same platform detection and visibility scheme,
//! namespaced by its macro prefix:
//!
//! ```text
//! gen-export-header header --prefix ANT -o include/ant/core/export.h
//! gen-export-header batch --manifest headers.json
//! gen-export-header resolve --target x86_64-pc-windows-msvc --build-kind build
//! ```

mod manifest;
mod resolve;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use platform_api::header::ExportHeader;
use platform_api::{BuildKind, Prefix, Toolchain};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::manifest::Manifest;

#[derive(Debug, Parser)]
#[command(name = "gen-export-header", version, about = "Generate per-library C export headers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render the export header for one prefix.
    Header {
        /// Macro prefix, e.g. ANT for ANT_API.
        #[arg(long)]
        prefix: Prefix,
        /// Output file (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also emit `#pragma once`.
        #[arg(long)]
        pragma_once: bool,
        /// Define NOMINMAX on Windows.
        #[arg(long)]
        nominmax: bool,
    },
    /// Render every header listed in a JSON manifest.
    Batch {
        #[arg(long)]
        manifest: PathBuf,
    },
    /// Show how a target triple resolves.
    Resolve {
        #[arg(long)]
        target: String,
        #[arg(long, value_enum, default_value_t = KindArg::Consume)]
        build_kind: KindArg,
        /// Override the toolchain implied by the triple.
        #[arg(long, value_enum)]
        toolchain: Option<ToolchainArg>,
        #[arg(long, default_value = "PROJECT")]
        prefix: Prefix,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    Static,
    Build,
    Consume,
}

impl From<KindArg> for BuildKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Static => BuildKind::Static,
            KindArg::Build => BuildKind::DynamicBuild,
            KindArg::Consume => BuildKind::DynamicConsume,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ToolchainArg {
    Msvc,
    GnuLike,
    Other,
}

impl From<ToolchainArg> for Toolchain {
    fn from(toolchain: ToolchainArg) -> Self {
        match toolchain {
            ToolchainArg::Msvc => Toolchain::Msvc,
            ToolchainArg::GnuLike => Toolchain::GnuLike,
            ToolchainArg::Other => Toolchain::Other,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Header {
            prefix,
            output,
            pragma_once,
            nominmax,
        } => {
            let header = ExportHeader::new(prefix).pragma_once(pragma_once).nominmax(nominmax);
            match output {
                Some(path) => write_header(&header, &path),
                None => io::stdout()
                    .write_all(header.render().as_bytes())
                    .context("Failed to write to stdout"),
            }
        }
        Command::Batch { manifest } => {
            let base_dir = manifest.parent().unwrap_or(Path::new("."));
            let jobs = Manifest::load(&manifest)?.jobs(base_dir)?;
            for job in &jobs {
                write_header(&job.header, &job.output)?;
            }
            info!(count = jobs.len(), manifest = %manifest.display(), "generated headers");
            Ok(())
        }
        Command::Resolve {
            target,
            build_kind,
            toolchain,
            prefix,
            json,
        } => {
            let resolution = resolve::resolve(&target, toolchain.map(Into::into), build_kind.into(), &prefix)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&resolution)?);
            } else {
                println!("{resolution}");
            }
            Ok(())
        }
    }
}

/// Write a header, leaving the file untouched when the content is unchanged
/// so dependent objects are not rebuilt.
fn write_header(header: &ExportHeader, path: &Path) -> Result<()> {
    let text = header.render();
    if fs::read_to_string(path).is_ok_and(|existing| existing == text) {
        info!(prefix = %header.prefix(), path = %path.display(), "header up to date");
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(path, text).with_context(|| format!("Failed to write output {}", path.display()))?;
    info!(prefix = %header.prefix(), path = %path.display(), "wrote header");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn invalid_prefix_is_a_usage_error() {
        let err = Cli::try_parse_from(["gen-export-header", "header", "--prefix", "my-lib"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn resolve_defaults() {
        let cli = Cli::try_parse_from(["gen-export-header", "resolve", "--target", "x86_64-unknown-linux-gnu"]).unwrap();
        match cli.command {
            Command::Resolve {
                build_kind, prefix, json, ..
            } => {
                assert!(matches!(build_kind, KindArg::Consume));
                assert_eq!(prefix.as_str(), "PROJECT");
                assert!(!json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn write_header_creates_parents_and_is_stable() {
        let dir = std::env::temp_dir().join(format!("gen-export-header-{}", std::process::id()));
        let path = dir.join("include/ant/export.h");
        let header = ExportHeader::new(Prefix::new("ANT").unwrap());

        write_header(&header, &path).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        write_header(&header, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), first);
        assert_eq!(first, header.render());

        fs::remove_dir_all(&dir).unwrap();
    }
}
