//! Just enough of `CMakePresets.json` to find a configure preset's build
//! directory: lookup by name, `inherits` merging, and the `binaryDir`
//! placeholders this project uses.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::{Map, Value};

pub type Preset = Map<String, Value>;

const CACHE_VARIABLES: &str = "cacheVariables";

pub fn load(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn find_configure_preset<'a>(presets: &'a Value, name: &str) -> Result<&'a Preset> {
    presets
        .get("configurePresets")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .find(|p| p.get("name").and_then(Value::as_str) == Some(name))
        .ok_or_else(|| anyhow!("configurePreset '{name}' not found in CMakePresets.json"))
}

/// Find a configure preset and fold its `inherits` chain into it.
pub fn resolve(presets: &Value, name: &str) -> Result<Preset> {
    let mut chain = Vec::new();
    merge_inherits(presets, name, &mut chain)
}

/// Bases are merged in order, then the preset itself. Later values replace
/// earlier top-level keys; `cacheVariables` are merged key by key.
fn merge_inherits(presets: &Value, name: &str, chain: &mut Vec<String>) -> Result<Preset> {
    if chain.iter().any(|n| n == name) {
        chain.push(name.to_string());
        bail!("inheritance cycle: {}", chain.join(" -> "));
    }
    let preset = find_configure_preset(presets, name)?;

    let bases: Vec<&str> = match preset.get("inherits") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(base)) if base.is_empty() => Vec::new(),
        Some(Value::String(base)) => vec![base.as_str()],
        Some(Value::Array(list)) => list
            .iter()
            .map(|b| b.as_str().ok_or_else(|| invalid_inherits(name)))
            .collect::<Result<_>>()?,
        Some(_) => return Err(invalid_inherits(name)),
    };
    if bases.is_empty() {
        return Ok(preset.clone());
    }

    chain.push(name.to_string());
    let mut merged = Preset::new();
    let mut cache = Map::new();
    for base in bases {
        let base = merge_inherits(presets, base, chain)?;
        overlay(&mut merged, &mut cache, &base, name)?;
    }
    chain.pop();

    overlay(&mut merged, &mut cache, preset, name)?;
    merged.insert(CACHE_VARIABLES.to_string(), Value::Object(cache));
    Ok(merged)
}

fn overlay(merged: &mut Preset, cache: &mut Map<String, Value>, from: &Preset, name: &str) -> Result<()> {
    for (key, value) in from {
        if key != CACHE_VARIABLES {
            merged.insert(key.clone(), value.clone());
        }
    }
    match from.get(CACHE_VARIABLES) {
        None => {}
        Some(Value::Object(vars)) => cache.extend(vars.iter().map(|(k, v)| (k.clone(), v.clone()))),
        Some(_) => bail!("cacheVariables of preset '{name}' is not an object"),
    }
    Ok(())
}

fn invalid_inherits(name: &str) -> anyhow::Error {
    anyhow!("Invalid inherits format in preset '{name}'")
}

/// CMake's `${hostSystemName}`.
pub fn host_system_name() -> &'static str {
    match std::env::consts::OS {
        "linux" => "Linux",
        "macos" => "Darwin",
        "windows" => "Windows",
        "freebsd" => "FreeBSD",
        other => other,
    }
}

/// Substitute `${sourceDir}`, `${hostSystemName}` and `${presetName}`.
/// A relative result is taken relative to `source_dir`, as CMake does.
pub fn resolve_binary_dir(template: &str, source_dir: &Path, preset_name: &str, host: &str) -> PathBuf {
    let dir = PathBuf::from(
        template
            .replace("${sourceDir}", &source_dir.to_string_lossy())
            .replace("${hostSystemName}", host)
            .replace("${presetName}", preset_name),
    );
    if dir.is_absolute() {
        dir
    } else {
        source_dir.join(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn presets() -> Value {
        json!({
            "version": 6,
            "configurePresets": [
                {
                    "name": "base",
                    "hidden": true,
                    "generator": "Ninja",
                    "binaryDir": "${sourceDir}/build/${hostSystemName}/${presetName}",
                    "cacheVariables": { "CMAKE_EXPORT_COMPILE_COMMANDS": "ON", "CMAKE_BUILD_TYPE": "Release" }
                },
                {
                    "name": "clang",
                    "hidden": true,
                    "cacheVariables": { "CMAKE_CXX_COMPILER": "clang++" }
                },
                {
                    "name": "linux-clang-debug",
                    "inherits": ["base", "clang"],
                    "cacheVariables": { "CMAKE_BUILD_TYPE": "Debug" }
                },
                {
                    "name": "single",
                    "inherits": "base",
                    "generator": "Unix Makefiles"
                },
                { "name": "loop-a", "inherits": "loop-b" },
                { "name": "loop-b", "inherits": "loop-a" },
                { "name": "bad", "inherits": 3 },
                { "name": "orphan", "inherits": "missing" }
            ]
        })
    }

    #[test]
    fn merges_list_in_order() {
        let preset = resolve(&presets(), "linux-clang-debug").unwrap();
        assert_eq!(preset["name"], "linux-clang-debug");
        assert_eq!(preset["generator"], "Ninja");
        assert_eq!(preset["hidden"], true);
        let cache = preset[CACHE_VARIABLES].as_object().unwrap();
        assert_eq!(cache["CMAKE_BUILD_TYPE"], "Debug");
        assert_eq!(cache["CMAKE_CXX_COMPILER"], "clang++");
        assert_eq!(cache["CMAKE_EXPORT_COMPILE_COMMANDS"], "ON");
    }

    #[test]
    fn derived_keys_override_base() {
        let preset = resolve(&presets(), "single").unwrap();
        assert_eq!(preset["generator"], "Unix Makefiles");
        assert_eq!(preset["binaryDir"], "${sourceDir}/build/${hostSystemName}/${presetName}");
        assert_eq!(preset[CACHE_VARIABLES]["CMAKE_BUILD_TYPE"], "Release");
    }

    #[test]
    fn preset_without_inherits_is_unchanged() {
        let doc = presets();
        let preset = resolve(&doc, "clang").unwrap();
        assert_eq!(&preset, find_configure_preset(&doc, "clang").unwrap());
    }

    #[test]
    fn errors() {
        let doc = presets();
        let cycle = resolve(&doc, "loop-a").unwrap_err().to_string();
        assert!(cycle.contains("loop-a -> loop-b -> loop-a"), "{cycle}");
        assert!(resolve(&doc, "bad").unwrap_err().to_string().contains("Invalid inherits"));
        assert!(resolve(&doc, "orphan").unwrap_err().to_string().contains("'missing' not found"));
        assert!(resolve(&doc, "nope").is_err());
        assert!(find_configure_preset(&json!({}), "base").is_err());
    }

    #[test]
    fn binary_dir_placeholders() {
        let dir = resolve_binary_dir(
            "${sourceDir}/build/${hostSystemName}/${presetName}",
            Path::new("/src/proj"),
            "linux-clang-debug",
            "Linux",
        );
        assert_eq!(dir, PathBuf::from("/src/proj/build/Linux/linux-clang-debug"));
    }

    #[test]
    fn relative_binary_dir_is_under_source_dir() {
        let dir = resolve_binary_dir("build/${presetName}", Path::new("/src/proj"), "dbg", "Linux");
        assert_eq!(dir, PathBuf::from("/src/proj/build/dbg"));
    }
}
