// Windows x64: decorated exports and imports.

use crate::{LinkModel, Platform};

pub(crate) const PLATFORM: Platform = Platform::WindowsX64;
pub(crate) const LINK_MODEL: LinkModel = LinkModel::Windows;
