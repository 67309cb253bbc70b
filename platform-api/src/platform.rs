use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::error::{PlatformError, Rejection};
use crate::target::TargetDescriptor;

/// Normalized platform identifier.
///
/// Only [`Platform::WindowsX64`] and [`Platform::Linux`] are ever produced
/// by [`resolve_platform`]. The others name the platforms that are
/// recognised and refused, and keep their macro names reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    WindowsX64,
    MacOs,
    Ios,
    Android,
    Linux,
    Unknown,
}

impl Platform {
    /// Suffix of the `<PREFIX>_PLATFORM_<ID>` macro. `Unknown` has none.
    pub const fn macro_suffix(self) -> Option<&'static str> {
        match self {
            Platform::WindowsX64 => Some("WINDOWS"),
            Platform::MacOs => Some("MACOS"),
            Platform::Ios => Some("IOS"),
            Platform::Android => Some("ANDROID"),
            Platform::Linux => Some("LINUX"),
            Platform::Unknown => None,
        }
    }

    pub const fn is_supported(self) -> bool {
        matches!(self, Platform::WindowsX64 | Platform::Linux)
    }

    pub const fn is_windows(self) -> bool {
        matches!(self, Platform::WindowsX64)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::WindowsX64 => "Windows x64",
            Platform::MacOs => "macOS",
            Platform::Ios => "iOS",
            Platform::Android => "Android",
            Platform::Linux => "Linux",
            Platform::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Resolve the platform of a target.
///
/// Conditions overlap (an Android toolchain also reports Linux, a simulator
/// also reports iPhone), so they are checked most specific first and the
/// first match wins.
pub fn resolve_platform(target: &TargetDescriptor) -> Result<Platform, PlatformError> {
    let resolved = if target.windows {
        if target.pointer_width == 64 {
            Ok(Platform::WindowsX64)
        } else {
            Err(Rejection::WindowsX86)
        }
    } else if target.apple {
        let apple = target.apple_target;
        if apple.simulator {
            Err(Rejection::IosSimulator)
        } else if apple.iphone {
            Err(Rejection::Ios)
        } else if apple.mac {
            Err(Rejection::MacOs)
        } else {
            Err(Rejection::UnknownApple)
        }
    } else if target.android {
        Err(Rejection::Android)
    } else if target.linux {
        Ok(Platform::Linux)
    } else {
        Err(Rejection::Unknown)
    };

    match resolved {
        Ok(platform) => {
            debug!(%platform, "resolved target platform");
            Ok(platform)
        }
        Err(rejection) => {
            debug!(?rejection, "target rejected");
            Err(rejection.into())
        }
    }
}
