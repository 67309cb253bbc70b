// Generic Linux. Shared objects export through default visibility and need
// no import decoration.

use crate::{LinkModel, Platform};

pub(crate) const PLATFORM: Platform = Platform::Linux;
pub(crate) const LINK_MODEL: LinkModel = LinkModel::Unix;
