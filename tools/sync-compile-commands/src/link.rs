use std::fmt;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LinkMode {
    Auto,
    Symlink,
    Hardlink,
    Copy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Symlink,
    Hardlink,
    Copy,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Symlink => "symlink",
            Method::Hardlink => "hardlink",
            Method::Copy => "copy",
        })
    }
}

/// Methods to try, in order. Symlinks on Windows need Developer Mode or
/// elevation, so `auto` falls back to a hardlink there.
pub fn strategy(mode: LinkMode, windows: bool) -> Vec<Method> {
    match mode {
        LinkMode::Symlink => vec![Method::Symlink],
        LinkMode::Hardlink => vec![Method::Hardlink],
        LinkMode::Copy => vec![Method::Copy],
        LinkMode::Auto if windows => vec![Method::Symlink, Method::Hardlink, Method::Copy],
        LinkMode::Auto => vec![Method::Symlink, Method::Copy],
    }
}

/// Remove a previous file or link at `path`. Directories are left alone.
pub fn remove_existing(path: &Path) -> Result<()> {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("Failed to inspect existing {}", path.display())),
    };
    if meta.is_dir() {
        bail!("Refusing to remove non-file path: {}", path.display());
    }
    fs::remove_file(path).with_context(|| format!("Failed to remove existing {}", path.display()))
}

#[derive(Debug)]
pub struct Outcome {
    pub method: Method,
    pub attempted: Vec<Method>,
}

/// Create `dst` from `src` with the first method of `methods` that works.
pub fn link(src: &Path, dst: &Path, methods: &[Method]) -> Result<Outcome> {
    let mut attempted = Vec::new();
    for &method in methods {
        attempted.push(method);
        match apply(method, src, dst) {
            Ok(()) => {
                debug!(%method, dst = %dst.display(), "linked compile_commands.json");
                return Ok(Outcome { method, attempted });
            }
            Err(e) => warn!(%method, error = %e, "link attempt failed"),
        }
    }

    let attempted: Vec<String> = attempted.iter().map(Method::to_string).collect();
    bail!(
        "Failed to create link/copy.\n\
         Attempted: {}\n\
         On Windows, symlink may require Developer Mode or Administrator.\n\
         Try --mode hardlink or --mode copy.",
        attempted.join(", ")
    )
}

fn apply(method: Method, src: &Path, dst: &Path) -> io::Result<()> {
    match method {
        Method::Symlink => {
            // Relative to the link's directory, so the link survives moving
            // the checkout. Both ends must be absolute first.
            let src = std::path::absolute(src)?;
            let target = match dst.parent() {
                Some(base) => relative_path(&src, &std::path::absolute(base)?),
                None => src,
            };
            symlink(&target, dst)
        }
        Method::Hardlink => fs::hard_link(src, dst),
        Method::Copy => fs::copy(src, dst).map(|_| ()),
    }
}

#[cfg(unix)]
fn symlink(target: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(windows)]
fn symlink(target: &Path, dst: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, dst)
}

#[cfg(not(any(unix, windows)))]
fn symlink(_target: &Path, _dst: &Path) -> io::Result<()> {
    Err(io::Error::new(io::ErrorKind::Unsupported, "symlinks are not supported here"))
}

/// `target` expressed relative to `base`. Both are expected to be absolute;
/// paths on different roots are returned unchanged.
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target_parts: Vec<Component> = target.components().collect();
    let base_parts: Vec<Component> = base.components().collect();

    if target_parts.first() != base_parts.first() {
        return target.to_path_buf();
    }

    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base_parts.len() {
        rel.push("..");
    }
    for part in &target_parts[common..] {
        rel.push(part.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    rel
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("sync-cc-link-{}-{}", name, std::process::id()));
        if dir.exists() {
            fs::remove_dir_all(&dir).unwrap();
        }
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn auto_strategy_per_platform() {
        assert_eq!(
            strategy(LinkMode::Auto, true),
            [Method::Symlink, Method::Hardlink, Method::Copy]
        );
        assert_eq!(strategy(LinkMode::Auto, false), [Method::Symlink, Method::Copy]);
        assert_eq!(strategy(LinkMode::Hardlink, false), [Method::Hardlink]);
    }

    #[test]
    fn relative_paths() {
        assert_eq!(
            relative_path(Path::new("/src/proj/build/dbg/cc.json"), Path::new("/src/proj")),
            PathBuf::from("build/dbg/cc.json")
        );
        assert_eq!(
            relative_path(Path::new("/src/build/cc.json"), Path::new("/src/proj")),
            PathBuf::from("../build/cc.json")
        );
    }

    #[test]
    fn copy_creates_destination() {
        let dir = scratch("copy");
        let src = dir.join("build/compile_commands.json");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "[]").unwrap();
        let dst = dir.join("compile_commands.json");

        let outcome = link(&src, &dst, &[Method::Copy]).unwrap();
        assert_eq!(outcome.method, Method::Copy);
        assert_eq!(fs::read_to_string(&dst).unwrap(), "[]");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn symlink_is_relative() {
        let dir = scratch("symlink");
        let src = dir.join("build/compile_commands.json");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "[]").unwrap();
        let dst = dir.join("compile_commands.json");

        link(&src, &dst, &strategy(LinkMode::Auto, false)).unwrap();
        assert_eq!(fs::read_link(&dst).unwrap(), PathBuf::from("build/compile_commands.json"));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "[]");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn failure_lists_attempts() {
        let dir = scratch("fail");
        let err = link(&dir.join("missing.json"), &dir.join("out.json"), &[Method::Hardlink, Method::Copy]).unwrap_err();
        assert!(err.to_string().contains("Attempted: hardlink, copy"), "{err}");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn remove_existing_refuses_directories() {
        let dir = scratch("remove");
        let file = dir.join("compile_commands.json");
        remove_existing(&file).unwrap();
        fs::write(&file, "[]").unwrap();
        remove_existing(&file).unwrap();
        assert!(!file.exists());

        fs::create_dir(&file).unwrap();
        assert!(remove_existing(&file).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
