//! Export/import decoration for symbols of a shared library.

use std::fmt;

use serde::Serialize;

use crate::platform::Platform;
use crate::target::Toolchain;

/// A symbol decoration as spelled in C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decoration {
    None,
    DllExport,
    DllImport,
    VisibilityDefault,
}

impl Decoration {
    pub const fn as_c(self) -> &'static str {
        match self {
            Decoration::None => "",
            Decoration::DllExport => "__declspec(dllexport)",
            Decoration::DllImport => "__declspec(dllimport)",
            Decoration::VisibilityDefault => "__attribute__((visibility(\"default\")))",
        }
    }

    pub const fn is_empty(self) -> bool {
        matches!(self, Decoration::None)
    }
}

impl fmt::Display for Decoration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_c())
    }
}

/// How a platform's linker learns which symbols cross a shared-library
/// boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkModel {
    /// `__declspec(dllexport)` / `__declspec(dllimport)`.
    Windows,
    /// Default visibility on export, nothing on import.
    Unix,
    /// No decoration either way.
    Plain,
}

impl LinkModel {
    pub fn for_target(windows: bool, toolchain: Toolchain) -> LinkModel {
        if windows {
            LinkModel::Windows
        } else if toolchain.is_gnu_like() {
            LinkModel::Unix
        } else {
            LinkModel::Plain
        }
    }

    pub fn for_platform(platform: Platform, toolchain: Toolchain) -> LinkModel {
        LinkModel::for_target(platform.is_windows(), toolchain)
    }

    pub const fn export(self) -> Decoration {
        match self {
            LinkModel::Windows => Decoration::DllExport,
            LinkModel::Unix => Decoration::VisibilityDefault,
            LinkModel::Plain => Decoration::None,
        }
    }

    pub const fn import(self) -> Decoration {
        match self {
            LinkModel::Windows => Decoration::DllImport,
            LinkModel::Unix | LinkModel::Plain => Decoration::None,
        }
    }
}

/// The role a compilation unit plays with respect to one library.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildKind {
    /// Linked statically; nothing to decorate.
    Static,
    /// Compiling the shared library itself.
    DynamicBuild,
    /// Compiling code that links against the shared library.
    #[default]
    DynamicConsume,
}

/// Independent build flags, as a build system would set them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildFlags {
    pub static_lib: bool,
    pub building: bool,
}

impl BuildKind {
    /// Collapse independent flags into one kind. Static beats building,
    /// building beats consuming.
    pub const fn from_flags(flags: BuildFlags) -> BuildKind {
        if flags.static_lib {
            BuildKind::Static
        } else if flags.building {
            BuildKind::DynamicBuild
        } else {
            BuildKind::DynamicConsume
        }
    }

    /// Build-kind selected by this crate's `static` and `build` features.
    pub const fn current() -> BuildKind {
        BuildKind::from_flags(BuildFlags {
            static_lib: cfg!(feature = "static"),
            building: cfg!(feature = "build"),
        })
    }
}

/// Resolve the decoration a public declaration carries.
pub const fn resolve_api(model: LinkModel, kind: BuildKind) -> Decoration {
    match kind {
        BuildKind::Static => Decoration::None,
        BuildKind::DynamicBuild => model.export(),
        BuildKind::DynamicConsume => model.import(),
    }
}

/// The three decorations generated for one library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiDecorations {
    pub export: Decoration,
    pub import: Decoration,
    pub api: Decoration,
}

impl ApiDecorations {
    pub const fn resolve(model: LinkModel, kind: BuildKind) -> ApiDecorations {
        ApiDecorations {
            export: model.export(),
            import: model.import(),
            api: resolve_api(model, kind),
        }
    }
}
