//! C header rendering.
//!
//! One header per library [`Prefix`]. The header repeats the platform
//! resolution order of [`crate::resolve_platform`] with preprocessor
//! conditionals and defines the library's `_API` macro with the precedence
//! of [`crate::BuildKind::from_flags`]. Diagnostics and decoration
//! spellings are taken from [`Rejection`] and [`LinkModel`], so the header
//! reports the same message as the Rust resolver for a given target.

use std::fmt::{self, Write};

use tracing::debug;

use crate::error::Rejection;
use crate::platform::Platform;
use crate::prefix::Prefix;
use crate::visibility::LinkModel;

const INDENT: &str = "    ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportHeader {
    prefix: Prefix,
    pragma_once: bool,
    nominmax: bool,
}

impl ExportHeader {
    pub fn new(prefix: Prefix) -> ExportHeader {
        ExportHeader {
            prefix,
            pragma_once: false,
            nominmax: false,
        }
    }

    /// Emit `#pragma once` in addition to the include guard.
    pub fn pragma_once(mut self, enabled: bool) -> ExportHeader {
        self.pragma_once = enabled;
        self
    }

    /// Define `NOMINMAX` on Windows before anything pulls in `<Windows.h>`.
    pub fn nominmax(mut self, enabled: bool) -> ExportHeader {
        self.nominmax = enabled;
        self
    }

    pub fn prefix(&self) -> &Prefix {
        &self.prefix
    }

    pub fn render(&self) -> String {
        let text = self.to_string();
        debug!(prefix = %self.prefix, bytes = text.len(), "rendered export header");
        text
    }

    fn platform_macro(&self, platform: Platform) -> String {
        // Every platform but `Unknown` has a macro name.
        self.prefix.platform_macro(platform).unwrap_or_default()
    }

    fn write_detection(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let l1 = INDENT;
        let l2 = INDENT.repeat(2);

        writeln!(f, "/* Platform detection. Conditions overlap, so the most specific is checked first. */")?;
        writeln!(f, "#if defined(_WIN32)")?;
        writeln!(f, "{l1}#if defined(_WIN64)")?;
        define(f, &l2, &self.platform_macro(Platform::WindowsX64), "")?;
        writeln!(f, "{l1}#else")?;
        error(f, &l2, Rejection::WindowsX86)?;
        writeln!(f, "{l1}#endif")?;

        writeln!(f, "#elif defined(__APPLE__) || defined(__MACH__)")?;
        writeln!(f, "{l1}#include <TargetConditionals.h>")?;
        writeln!(f, "{l1}/* TARGET_OS_MAC is set on every Apple platform. */")?;
        writeln!(f, "{l1}#if TARGET_IPHONE_SIMULATOR == 1")?;
        error(f, &l2, Rejection::IosSimulator)?;
        writeln!(f, "{l1}#elif TARGET_OS_IPHONE == 1")?;
        define(f, &l2, &self.platform_macro(Platform::Ios), "")?;
        error(f, &l2, Rejection::Ios)?;
        writeln!(f, "{l1}#elif TARGET_OS_MAC == 1")?;
        define(f, &l2, &self.platform_macro(Platform::MacOs), "")?;
        error(f, &l2, Rejection::MacOs)?;
        writeln!(f, "{l1}#else")?;
        error(f, &l2, Rejection::UnknownApple)?;
        writeln!(f, "{l1}#endif")?;

        writeln!(f, "/* Android defines __linux__ as well. */")?;
        writeln!(f, "#elif defined(__ANDROID__)")?;
        define(f, l1, &self.platform_macro(Platform::Android), "")?;
        error(f, l1, Rejection::Android)?;
        writeln!(f, "#elif defined(__linux__)")?;
        define(f, l1, &self.platform_macro(Platform::Linux), "")?;
        writeln!(f, "#else")?;
        error(f, l1, Rejection::Unknown)?;
        writeln!(f, "#endif")
    }

    fn write_decorations(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.prefix;
        let (export, import) = (p.export_macro(), p.import_macro());
        let windows = self.platform_macro(Platform::WindowsX64);

        writeln!(f, "#if defined({windows})")?;
        define(f, INDENT, &export, LinkModel::Windows.export().as_c())?;
        define(f, INDENT, &import, LinkModel::Windows.import().as_c())?;
        writeln!(f, "#elif defined(__GNUC__) || defined(__clang__)")?;
        define(f, INDENT, &export, LinkModel::Unix.export().as_c())?;
        define(f, INDENT, &import, LinkModel::Unix.import().as_c())?;
        writeln!(f, "#else")?;
        define(f, INDENT, &export, LinkModel::Plain.export().as_c())?;
        define(f, INDENT, &import, LinkModel::Plain.import().as_c())?;
        writeln!(f, "#endif")?;
        writeln!(f)?;

        writeln!(f, "/* {} > {} > consumer. */", p.static_flag(), p.build_flag())?;
        writeln!(f, "#if defined({})", p.static_flag())?;
        define(f, INDENT, &p.api_macro(), "")?;
        writeln!(f, "#elif defined({})", p.build_flag())?;
        define(f, INDENT, &p.api_macro(), &export)?;
        writeln!(f, "#else")?;
        define(f, INDENT, &p.api_macro(), &import)?;
        writeln!(f, "#endif")
    }
}

impl fmt::Display for ExportHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let guard = self.prefix.include_guard();

        writeln!(f, "/* {} export header. Generated by gen-export-header; do not edit. */", self.prefix)?;
        if self.pragma_once {
            writeln!(f, "#pragma once")?;
        }
        writeln!(f, "#ifndef {guard}")?;
        writeln!(f, "#define {guard}")?;
        writeln!(f)?;

        self.write_detection(f)?;
        writeln!(f)?;

        if self.nominmax {
            writeln!(f, "#if defined({})", self.platform_macro(Platform::WindowsX64))?;
            writeln!(f, "{INDENT}#ifndef NOMINMAX")?;
            define(f, &INDENT.repeat(2), "NOMINMAX", "")?;
            writeln!(f, "{INDENT}#endif")?;
            writeln!(f, "#endif")?;
            writeln!(f)?;
        }

        self.write_decorations(f)?;
        writeln!(f)?;
        writeln!(f, "#endif /* {guard} */")
    }
}

fn define(f: &mut impl Write, indent: &str, name: &str, value: &str) -> fmt::Result {
    if value.is_empty() {
        writeln!(f, "{indent}#define {name}")
    } else {
        writeln!(f, "{indent}#define {name} {value}")
    }
}

fn error(f: &mut impl Write, indent: &str, rejection: Rejection) -> fmt::Result {
    writeln!(f, "{indent}#error \"{}\"", rejection.message())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(prefix: &str) -> String {
        ExportHeader::new(Prefix::new(prefix).unwrap()).render()
    }

    fn position(text: &str, needle: &str) -> usize {
        text.find(needle).unwrap_or_else(|| panic!("`{needle}` missing from header:\n{text}"))
    }

    #[test]
    fn whole_body_sits_inside_the_guard() {
        let text = header("ANT");
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        assert_eq!(lines[1], "#ifndef ANT_EXPORT_H");
        assert_eq!(lines[2], "#define ANT_EXPORT_H");
        assert_eq!(*lines.last().unwrap(), "#endif /* ANT_EXPORT_H */");
        assert!(!text.contains("#pragma once"));
    }

    #[test]
    fn conditionals_are_balanced() {
        let text = ExportHeader::new(Prefix::new("PROJ").unwrap())
            .pragma_once(true)
            .nominmax(true)
            .render();
        let opened = text
            .lines()
            .map(str::trim_start)
            .filter(|l| l.starts_with("#if"))
            .count();
        let closed = text
            .lines()
            .map(str::trim_start)
            .filter(|l| l.starts_with("#endif"))
            .count();
        assert_eq!(opened, closed);
        assert!(text.contains("#pragma once"));
        assert!(text.contains("#define NOMINMAX"));
    }

    #[test]
    fn android_checked_before_linux() {
        let text = header("ANT");
        assert!(position(&text, "defined(__ANDROID__)") < position(&text, "defined(__linux__)"));
        assert!(position(&text, "TARGET_IPHONE_SIMULATOR") < position(&text, "TARGET_OS_IPHONE =="));
        assert!(position(&text, "TARGET_OS_IPHONE ==") < position(&text, "TARGET_OS_MAC =="));
    }

    #[test]
    fn every_rejection_is_reported() {
        let text = header("ANT");
        for rejection in Rejection::ALL {
            assert!(
                text.contains(&format!("#error \"{}\"", rejection.message())),
                "missing {rejection:?}"
            );
        }
    }

    #[test]
    fn api_macro_has_single_precedence_chain() {
        let text = header("ANT");
        let chain = &text[position(&text, "#if defined(ANT_STATIC)")..];
        let expected = [
            "#if defined(ANT_STATIC)",
            "    #define ANT_API",
            "#elif defined(ANT_BUILD)",
            "    #define ANT_API ANT_API_EXPORT",
            "#else",
            "    #define ANT_API ANT_API_IMPORT",
            "#endif",
        ];
        let actual: Vec<&str> = chain.lines().take(expected.len()).collect();
        assert_eq!(actual, expected);
        assert_eq!(text.matches("#define ANT_API\n").count(), 1);
    }

    #[test]
    fn decorations_use_c_spellings() {
        let text = header("ANT");
        assert!(text.contains("#define ANT_API_EXPORT __declspec(dllexport)"));
        assert!(text.contains("#define ANT_API_IMPORT __declspec(dllimport)"));
        assert!(text.contains(r#"#define ANT_API_EXPORT __attribute__((visibility("default")))"#));
        assert!(!text.contains("#define ANT_API_IMPORT \n"));
    }

    #[test]
    fn prefixes_do_not_leak() {
        let text = header("PROJ");
        assert!(!text.contains("ANT_"));
        assert!(text.contains("#define PROJ_PLATFORM_LINUX"));
    }
}
