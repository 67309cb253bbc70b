//! Platform identification and shared-library symbol visibility.
//!
//! The crate resolves two things for a compilation target:
//!
//! - a [`Platform`] identifier, chosen from the target's predefined
//!   conditions in a fixed priority order, and
//! - the visibility [`Decoration`]s a public interface uses, from the
//!   target's [`LinkModel`] and the library's [`BuildKind`].
//!
//! The rules are evaluated in two places. With the `host` feature (default)
//! the crate itself refuses to compile for an unsupported target and exposes
//! the resolved host as [`Platform::current`]. The same rules are also
//! available as pure functions over a [`TargetDescriptor`], which is what
//! [`header::ExportHeader`] renders into a C header per library [`Prefix`].

// Host selection. Every rejected target gets exactly one diagnostic.
#[cfg(all(feature = "host", target_os = "windows", not(target_pointer_width = "64")))]
compile_error!("x86 builds are not supported!");

#[cfg(all(
    feature = "host",
    target_vendor = "apple",
    any(
        target_abi = "sim",
        all(
            any(target_os = "ios", target_os = "tvos", target_os = "watchos", target_os = "visionos"),
            any(target_arch = "x86_64", target_arch = "x86")
        )
    )
))]
compile_error!("iOS simulator is not supported!");

#[cfg(all(
    feature = "host",
    target_vendor = "apple",
    any(target_os = "ios", target_os = "tvos", target_os = "watchos", target_os = "visionos"),
    not(target_abi = "sim"),
    not(any(target_arch = "x86_64", target_arch = "x86"))
))]
compile_error!("iOS is not supported!");

#[cfg(all(feature = "host", target_vendor = "apple", target_os = "macos", not(target_abi = "sim")))]
compile_error!("macOS is not supported!");

#[cfg(all(
    feature = "host",
    target_vendor = "apple",
    not(target_abi = "sim"),
    not(any(
        target_os = "ios",
        target_os = "tvos",
        target_os = "watchos",
        target_os = "visionos",
        target_os = "macos"
    ))
))]
compile_error!("Unknown Apple platform!");

#[cfg(all(feature = "host", target_os = "android"))]
compile_error!("Android is not supported!");

#[cfg(all(
    feature = "host",
    not(any(
        target_os = "windows",
        target_vendor = "apple",
        target_os = "android",
        target_os = "linux"
    ))
))]
compile_error!("Unknown platform!");

#[cfg(all(feature = "host", target_os = "windows", target_pointer_width = "64"))]
#[path = "host/windows.rs"]
mod host;

#[cfg(all(feature = "host", target_os = "linux"))]
#[path = "host/linux.rs"]
mod host;

pub mod diagnostics;
pub mod error;
pub mod header;
pub mod platform;
pub mod prefix;
pub mod target;
pub mod visibility;

pub use error::{PlatformError, PrefixError, Rejection};
pub use platform::{resolve_platform, Platform};
pub use prefix::Prefix;
pub use target::{AppleTarget, TargetCfg, TargetDescriptor, Toolchain};
pub use visibility::{resolve_api, ApiDecorations, BuildFlags, BuildKind, Decoration, LinkModel};

#[cfg(feature = "host")]
impl Platform {
    /// The platform this crate was compiled for.
    pub const fn current() -> Platform {
        host::PLATFORM
    }
}

#[cfg(feature = "host")]
impl LinkModel {
    /// The link model of the host toolchain. Rust compiles with an
    /// LLVM backend, which honours the Unix visibility model everywhere but
    /// on Windows.
    pub const fn current() -> LinkModel {
        host::LINK_MODEL
    }
}

/// Decorations for the crate being compiled, from the host link model and
/// the `static` / `build` features.
#[cfg(feature = "host")]
pub fn current_api() -> ApiDecorations {
    ApiDecorations::resolve(LinkModel::current(), BuildKind::current())
}
