//! Batch manifest: one entry per library whose export header is generated.
//!
//! ```json
//! {
//!   "headers": [
//!     { "prefix": "ANT", "output": "include/ant/core/export.h", "pragma_once": true },
//!     { "prefix": "PROJ", "output": "include/project/core/export.h" }
//!   ]
//! }
//! ```
//!
//! Relative `output` paths are resolved against the manifest's directory.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use platform_api::header::ExportHeader;
use platform_api::Prefix;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub headers: Vec<HeaderEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HeaderEntry {
    pub prefix: String,
    pub output: PathBuf,
    #[serde(default)]
    pub pragma_once: bool,
    #[serde(default)]
    pub nominmax: bool,
}

/// A validated manifest entry ready to be written.
#[derive(Debug)]
pub struct Job {
    pub header: ExportHeader,
    pub output: PathBuf,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Manifest> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Failed to parse manifest {}", path.display()))
    }

    /// Validate prefixes and resolve output paths against `base_dir`.
    pub fn jobs(self, base_dir: &Path) -> Result<Vec<Job>> {
        if self.headers.is_empty() {
            bail!("manifest lists no headers");
        }

        let mut seen = HashSet::new();
        let mut outputs = HashSet::new();
        let mut jobs = Vec::with_capacity(self.headers.len());

        for entry in self.headers {
            let prefix = Prefix::new(entry.prefix.as_str())
                .with_context(|| format!("invalid prefix in manifest entry `{}`", entry.prefix))?;
            if !seen.insert(prefix.clone()) {
                bail!("prefix `{}` is listed more than once", prefix);
            }

            let output = if entry.output.is_absolute() {
                entry.output
            } else {
                base_dir.join(entry.output)
            };
            if !outputs.insert(output.clone()) {
                bail!("output {} is listed more than once", output.display());
            }

            jobs.push(Job {
                header: ExportHeader::new(prefix)
                    .pragma_once(entry.pragma_once)
                    .nominmax(entry.nominmax),
                output,
            });
        }

        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Manifest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn resolves_relative_outputs() {
        let manifest = parse(
            r#"{"headers": [
                {"prefix": "ANT", "output": "include/ant/export.h", "pragma_once": true},
                {"prefix": "PROJ", "output": "include/project/export.h"}
            ]}"#,
        );
        let jobs = manifest.jobs(Path::new("/repo")).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].output, Path::new("/repo/include/ant/export.h"));
        assert_eq!(jobs[0].header.prefix().as_str(), "ANT");
        assert!(jobs[0].header.render().contains("#pragma once"));
        assert!(!jobs[1].header.render().contains("#pragma once"));
    }

    #[test]
    fn rejects_duplicate_prefix() {
        let manifest = parse(
            r#"{"headers": [
                {"prefix": "ANT", "output": "a.h"},
                {"prefix": "ANT", "output": "b.h"}
            ]}"#,
        );
        let err = manifest.jobs(Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("more than once"), "{err}");
    }

    #[test]
    fn rejects_duplicate_output() {
        let manifest = parse(
            r#"{"headers": [
                {"prefix": "ANT", "output": "a.h"},
                {"prefix": "PROJ", "output": "a.h"}
            ]}"#,
        );
        assert!(manifest.jobs(Path::new(".")).is_err());
    }

    #[test]
    fn rejects_bad_prefix() {
        let manifest = parse(r#"{"headers": [{"prefix": "ant", "output": "a.h"}]}"#);
        let err = manifest.jobs(Path::new(".")).unwrap_err();
        assert!(format!("{err:#}").contains("must start with an uppercase letter"), "{err:#}");
    }

    #[test]
    fn rejects_unknown_fields_and_empty_lists() {
        assert!(serde_json::from_str::<Manifest>(r#"{"headers": [], "extra": 1}"#).is_err());
        assert!(parse(r#"{"headers": []}"#).jobs(Path::new(".")).is_err());
    }
}
