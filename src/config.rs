//! Project configuration and repository layout.
//!
//! Handles loading, validating and updating `woolly.toml` at the repository
//! root. Every key is optional; stock defaults are the base layer and the file
//! overrides only what it names.
//!
//! ## Config File
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! name = "woolly"             # Manifest name (place manifests get "-<Place>")
//! default_place = "MainPlace" # Place used when a command omits one
//!
//! [paths]
//! src = "src"                 # Base source tree
//! overrides = "place_overrides" # One overlay tree per place
//! places = "places"           # Where <Place>.project.json files are written
//! packages = "Packages"       # Vendor packages (wally install target)
//! builds = "builds"           # Build outputs
//! ```
//!
//! Unknown keys are rejected to catch typos early.
//!
//! `woolly switch <Place>` rewrites only `default_place`, leaving the rest of
//! the file as the user wrote it.

use crate::naming;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "woolly.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Project configuration loaded from `woolly.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WoollyConfig {
    /// Manifest name for the default project; place manifests append `-<Place>`.
    pub name: String,
    /// Place used by `gen`, `serve`, `build` and friends when none is given.
    pub default_place: String,
    /// Repository directories, relative to the root.
    pub paths: PathsConfig,
}

impl Default for WoollyConfig {
    fn default() -> Self {
        Self {
            name: "woolly".to_string(),
            default_place: "MainPlace".to_string(),
            paths: PathsConfig::default(),
        }
    }
}

impl WoollyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Validation("name must not be empty".into()));
        }
        if !naming::is_valid_place_name(&self.default_place) {
            return Err(ConfigError::Validation(format!(
                "default_place {:?} must be alphanumeric, dashes, or underscores",
                self.default_place
            )));
        }
        for (key, value) in self.paths.entries() {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "paths.{key} must not be empty"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub src: String,
    pub overrides: String,
    pub places: String,
    pub packages: String,
    pub builds: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: "src".to_string(),
            overrides: "place_overrides".to_string(),
            places: "places".to_string(),
            packages: "Packages".to_string(),
            builds: "builds".to_string(),
        }
    }
}

impl PathsConfig {
    fn entries(&self) -> [(&'static str, &str); 5] {
        [
            ("src", self.src.as_str()),
            ("overrides", self.overrides.as_str()),
            ("places", self.places.as_str()),
            ("packages", self.packages.as_str()),
            ("builds", self.builds.as_str()),
        ]
    }
}

// =============================================================================
// Loading, merging and persisting
// =============================================================================

/// The stock defaults as a TOML table, used as the base merge layer.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(WoollyConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `woolly.toml` from `root` as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto `base`, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<WoollyConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: WoollyConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the project config from `root`, falling back to stock defaults.
pub fn load_config(root: &Path) -> Result<WoollyConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Persist `place` as the default place, creating `woolly.toml` if needed.
///
/// The new file is validated before it is written; an invalid place name
/// leaves the existing file untouched.
pub fn set_default_place(root: &Path, place: &str) -> Result<WoollyConfig, ConfigError> {
    let mut raw = load_raw_config(root)?
        .unwrap_or_else(|| toml::Value::Table(toml::map::Map::new()));

    let toml::Value::Table(table) = &mut raw else {
        return Err(ConfigError::Validation(format!(
            "{CONFIG_FILE} must be a table"
        )));
    };
    table.insert(
        "default_place".to_string(),
        toml::Value::String(place.to_string()),
    );

    let config = resolve_config(stock_defaults_value()?, Some(raw.clone()))?;
    fs::write(root.join(CONFIG_FILE), toml::to_string_pretty(&raw)?)?;
    Ok(config)
}

/// A documented `woolly.toml` with every key at its default, for `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Woolly Configuration
# ====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.

# Manifest name. Place manifests are named "<name>-<Place>".
name = "woolly"

# Place used by gen, open, setup, serve and build when none is given.
# `woolly switch <Place>` rewrites this key.
default_place = "MainPlace"

# ---------------------------------------------------------------------------
# Repository layout (relative to the repository root)
# ---------------------------------------------------------------------------
[paths]
# Base source tree shared by every place.
src = "src"

# Per-place override trees: <overrides>/<Place>/...
overrides = "place_overrides"

# Where <Place>.project.json files are written.
places = "places"

# Vendor packages, mounted as ReplicatedStorage.ExternalPackages.
packages = "Packages"

# Build outputs: <builds>/<Place>.rbxlx
builds = "builds"
"##
}

// =============================================================================
// Layout
// =============================================================================

/// Absolute repository paths resolved from the config.
#[derive(Debug, Clone)]
pub struct Layout {
    pub root: PathBuf,
    pub config: WoollyConfig,
    pub src: PathBuf,
    pub overrides: PathBuf,
    pub places: PathBuf,
    pub packages: PathBuf,
    pub builds: PathBuf,
}

impl Layout {
    pub fn new(root: &Path, config: WoollyConfig) -> Self {
        let root = std::path::absolute(root).unwrap_or_else(|_| root.to_path_buf());
        let paths = &config.paths;
        Self {
            src: root.join(&paths.src),
            overrides: root.join(&paths.overrides),
            places: root.join(&paths.places),
            packages: root.join(&paths.packages),
            builds: root.join(&paths.builds),
            root,
            config,
        }
    }

    /// Read `woolly.toml` under `root` and resolve the layout.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config = load_config(root)?;
        Ok(Self::new(root, config))
    }

    /// Override directory for a place, whether or not it exists yet.
    pub fn place_overrides(&self, place: &str) -> PathBuf {
        self.overrides.join(place)
    }

    /// Root that scaffolding writes into for `place`: its override tree if it
    /// exists, the base source tree otherwise.
    pub fn source_root_for(&self, place: Option<&str>) -> PathBuf {
        match place.map(|p| self.place_overrides(p)) {
            Some(dir) if dir.is_dir() => dir,
            _ => self.src.clone(),
        }
    }

    pub fn build_output(&self, place: &str) -> PathBuf {
        self.builds.join(format!("{place}.rbxlx"))
    }

    /// Display a path relative to the repository root.
    pub fn display(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }
}
