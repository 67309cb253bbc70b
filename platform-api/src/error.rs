use serde::Serialize;
use thiserror::Error;

/// Why a target was refused. Each variant maps to one branch of the
/// platform resolution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rejection {
    WindowsX86,
    IosSimulator,
    Ios,
    MacOs,
    UnknownApple,
    Android,
    Unknown,
}

impl Rejection {
    pub const ALL: [Rejection; 7] = [
        Rejection::WindowsX86,
        Rejection::IosSimulator,
        Rejection::Ios,
        Rejection::MacOs,
        Rejection::UnknownApple,
        Rejection::Android,
        Rejection::Unknown,
    ];

    /// Diagnostic text. The compile-time guard in `lib.rs` and the
    /// generated C header use the same wording.
    pub const fn message(self) -> &'static str {
        match self {
            Rejection::WindowsX86 => "x86 builds are not supported!",
            Rejection::IosSimulator => "iOS simulator is not supported!",
            Rejection::Ios => "iOS is not supported!",
            Rejection::MacOs => "macOS is not supported!",
            Rejection::UnknownApple => "Unknown Apple platform!",
            Rejection::Android => "Android is not supported!",
            Rejection::Unknown => "Unknown platform!",
        }
    }
}

/// The target is unsupported or could not be identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{}", .rejection.message())]
pub struct PlatformError {
    pub rejection: Rejection,
}

impl From<Rejection> for PlatformError {
    fn from(rejection: Rejection) -> Self {
        PlatformError { rejection }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    #[error("prefix is empty")]
    Empty,
    #[error("prefix `{0}` must start with an uppercase letter or underscore")]
    BadStart(String),
    #[error("prefix `{prefix}` contains `{found}`; only A-Z, 0-9 and _ are allowed")]
    BadChar { prefix: String, found: char },
}
