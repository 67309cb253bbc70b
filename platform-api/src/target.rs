//! Target descriptors.
//!
//! A [`TargetDescriptor`] records the conditions a compiler predefines for
//! a target, the way a C preprocessor sees them: `_WIN32`, `_WIN64`,
//! `__APPLE__`, the `TargetConditionals.h` flags, `__ANDROID__`,
//! `__linux__`. They overlap on purpose; [`crate::resolve_platform`]
//! decides between them.

use std::env;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Toolchain {
    /// MSVC or clang-cl.
    Msvc,
    /// GCC, Clang, or rustc's LLVM backend.
    #[default]
    GnuLike,
    Other,
}

impl Toolchain {
    pub const fn is_gnu_like(self) -> bool {
        matches!(self, Toolchain::GnuLike)
    }
}

/// `TargetConditionals.h` flags. `mac` is only set for macOS itself, so an
/// Apple target outside the iPhone family and macOS stays unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct AppleTarget {
    pub simulator: bool,
    pub iphone: bool,
    pub mac: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TargetDescriptor {
    pub windows: bool,
    pub pointer_width: u32,
    pub apple: bool,
    pub apple_target: AppleTarget,
    pub android: bool,
    pub linux: bool,
    pub toolchain: Toolchain,
}

/// Cargo's view of a target, as exposed to build scripts through
/// `CARGO_CFG_TARGET_*`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetCfg {
    pub os: String,
    pub arch: String,
    pub vendor: String,
    pub env: String,
    pub abi: String,
    pub pointer_width: u32,
}

/// Operating systems that set `TARGET_OS_IPHONE`.
pub const IPHONE_FAMILY: [&str; 4] = ["ios", "tvos", "watchos", "visionos"];

impl TargetCfg {
    /// Read the target configuration inside a build script. Missing
    /// variables are treated as empty.
    pub fn from_env() -> TargetCfg {
        TargetCfg::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from any `CARGO_CFG_TARGET_*` source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> TargetCfg {
        let var = |name: &str| lookup(name).unwrap_or_default();
        TargetCfg {
            os: var("CARGO_CFG_TARGET_OS"),
            arch: var("CARGO_CFG_TARGET_ARCH"),
            vendor: var("CARGO_CFG_TARGET_VENDOR"),
            env: var("CARGO_CFG_TARGET_ENV"),
            abi: var("CARGO_CFG_TARGET_ABI"),
            pointer_width: var("CARGO_CFG_TARGET_POINTER_WIDTH").parse().unwrap_or(0),
        }
    }
}

impl TargetDescriptor {
    /// The target this crate is being compiled for.
    pub fn host() -> TargetDescriptor {
        let cfg = TargetCfg {
            os: env::consts::OS.to_string(),
            arch: env::consts::ARCH.to_string(),
            vendor: if cfg!(target_vendor = "apple") { "apple" } else { "unknown" }.to_string(),
            env: if cfg!(target_env = "msvc") {
                "msvc"
            } else if cfg!(target_env = "gnu") {
                "gnu"
            } else if cfg!(target_env = "musl") {
                "musl"
            } else {
                ""
            }
            .to_string(),
            abi: if cfg!(target_abi = "sim") { "sim" } else { "" }.to_string(),
            pointer_width: usize::BITS,
        };
        TargetDescriptor::from_cfg(&cfg)
    }

    /// Shorthand for `from_cfg(&TargetCfg::from_env())` in build scripts.
    pub fn from_cargo_env() -> TargetDescriptor {
        TargetDescriptor::from_cfg(&TargetCfg::from_env())
    }

    pub fn from_cfg(cfg: &TargetCfg) -> TargetDescriptor {
        let apple = cfg.vendor == "apple";
        let iphone = apple && IPHONE_FAMILY.contains(&cfg.os.as_str());
        // x86 iOS targets predate the `sim` ABI and only ever run in the simulator.
        let simulator = apple && (cfg.abi == "sim" || (iphone && is_x86(&cfg.arch)));
        let android = cfg.os == "android";

        TargetDescriptor {
            windows: cfg.os == "windows",
            pointer_width: cfg.pointer_width,
            apple,
            apple_target: AppleTarget {
                simulator,
                iphone,
                mac: apple && cfg.os == "macos",
            },
            android,
            linux: cfg.os == "linux" || android,
            toolchain: if cfg.env == "msvc" {
                Toolchain::Msvc
            } else {
                Toolchain::GnuLike
            },
        }
    }

    /// Parse a target triple such as `x86_64-pc-windows-msvc` or
    /// `aarch64-apple-ios-sim`. Unrecognised components are ignored, so an
    /// unknown triple yields a descriptor that resolves to
    /// [`crate::Platform::Unknown`]'s rejection.
    pub fn from_triple(triple: &str) -> TargetDescriptor {
        let mut parts = triple.trim().split('-');
        let arch = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();
        let any = |pred: &dyn Fn(&str) -> bool| rest.iter().any(|part| pred(part));

        let windows = any(&|p| p == "windows" || p == "win32" || p.starts_with("mingw"));
        let mac = any(&|p| p == "darwin" || p.starts_with("macos"));
        let iphone = any(&|p| IPHONE_FAMILY.iter().any(|os| p.starts_with(os)));
        let apple = any(&|p| p == "apple") || mac || iphone;
        let simulator = apple && (any(&|p| p == "sim" || p == "simulator") || (iphone && is_x86(arch)));
        let android = any(&|p| p.starts_with("android"));
        let linux = any(&|p| p == "linux") || android;

        let pointer_width = if any(&|p| p.ends_with("x32") || p.ends_with("ilp32")) {
            32
        } else {
            arch_pointer_width(arch)
        };

        TargetDescriptor {
            windows,
            pointer_width,
            apple,
            apple_target: AppleTarget {
                simulator,
                iphone,
                mac,
            },
            android,
            linux,
            toolchain: if any(&|p| p == "msvc") {
                Toolchain::Msvc
            } else {
                Toolchain::GnuLike
            },
        }
    }

    pub fn with_toolchain(mut self, toolchain: Toolchain) -> TargetDescriptor {
        self.toolchain = toolchain;
        self
    }
}

fn is_x86(arch: &str) -> bool {
    matches!(arch, "x86_64" | "x86_64h" | "x86" | "i386" | "i586" | "i686")
}

fn arch_pointer_width(arch: &str) -> u32 {
    match arch {
        "arm64_32" => 32,
        "s390x" => 64,
        a if a.contains("64") => 64,
        "" => 0,
        _ => 32,
    }
}
