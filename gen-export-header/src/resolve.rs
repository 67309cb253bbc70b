//! `resolve` subcommand: evaluate the platform and visibility rules for a
//! target triple without generating anything.

use std::fmt;

use anyhow::{Context, Result};
use platform_api::{
    resolve_platform, ApiDecorations, BuildKind, LinkModel, Platform, Prefix, TargetDescriptor, Toolchain,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct Resolution {
    pub target: String,
    pub platform: Platform,
    pub platform_macro: Option<String>,
    pub link_model: LinkModel,
    pub build_kind: BuildKind,
    pub export: String,
    pub import: String,
    pub api: String,
}

pub fn resolve(
    triple: &str,
    toolchain: Option<Toolchain>,
    kind: BuildKind,
    prefix: &Prefix,
) -> Result<Resolution> {
    let mut target = TargetDescriptor::from_triple(triple);
    if let Some(toolchain) = toolchain {
        target = target.with_toolchain(toolchain);
    }
    tracing::debug!(?target, "parsed target triple");

    let platform = resolve_platform(&target).with_context(|| format!("target `{triple}`"))?;
    let link_model = LinkModel::for_platform(platform, target.toolchain);
    let api = ApiDecorations::resolve(link_model, kind);

    Ok(Resolution {
        target: triple.to_string(),
        platform,
        platform_macro: prefix.platform_macro(platform),
        link_model,
        build_kind: kind,
        export: api.export.as_c().to_string(),
        import: api.import.as_c().to_string(),
        api: api.api.as_c().to_string(),
    })
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "target:     {}", self.target)?;
        writeln!(f, "platform:   {}", self.platform)?;
        if let Some(name) = &self.platform_macro {
            writeln!(f, "macro:      {name}")?;
        }
        writeln!(f, "link model: {:?}", self.link_model)?;
        writeln!(f, "build kind: {:?}", self.build_kind)?;
        writeln!(f, "export:     [{}]", self.export)?;
        writeln!(f, "import:     [{}]", self.import)?;
        write!(f, "api:        [{}]", self.api)
    }
}
