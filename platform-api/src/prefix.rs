use std::fmt;
use std::str::FromStr;

use crate::error::PrefixError;
use crate::platform::Platform;

/// Macro namespace of one library, e.g. `ANT` for `ANT_API`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Prefix(String);

impl Prefix {
    pub fn new(prefix: impl Into<String>) -> Result<Prefix, PrefixError> {
        let prefix = prefix.into();
        let mut chars = prefix.chars();
        match chars.next() {
            None => return Err(PrefixError::Empty),
            Some(c) if c.is_ascii_uppercase() || c == '_' => {}
            Some(_) => return Err(PrefixError::BadStart(prefix)),
        }
        if let Some(found) = chars.find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '_')) {
            return Err(PrefixError::BadChar { prefix, found });
        }
        Ok(Prefix(prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn name(&self, suffix: &str) -> String {
        format!("{}_{}", self.0, suffix)
    }

    /// `<P>_PLATFORM_<ID>`, or `None` for [`Platform::Unknown`].
    pub fn platform_macro(&self, platform: Platform) -> Option<String> {
        platform
            .macro_suffix()
            .map(|id| self.name(&format!("PLATFORM_{id}")))
    }

    pub fn export_macro(&self) -> String {
        self.name("API_EXPORT")
    }

    pub fn import_macro(&self) -> String {
        self.name("API_IMPORT")
    }

    pub fn api_macro(&self) -> String {
        self.name("API")
    }

    pub fn static_flag(&self) -> String {
        self.name("STATIC")
    }

    pub fn build_flag(&self) -> String {
        self.name("BUILD")
    }

    pub fn include_guard(&self) -> String {
        self.name("EXPORT_H")
    }
}

impl FromStr for Prefix {
    type Err = PrefixError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prefix::new(s)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
