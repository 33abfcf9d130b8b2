//! Manifest assembly: builds the full project tree for one target and writes
//! it as `*.project.json`.
//!
//! ## Stages
//!
//! 1. **Zones**: `Shared`, `Server` and `Client` are built as standalone
//!    `Folder` containers, section by section, from the base source tree with
//!    the place's override tree layered on top (see [`SECTIONS`]).
//! 2. **Systems**: every bundle under `src/_systems/`, then under
//!    `<overrides>/<Place>/_systems/`, is folded into the zones with
//!    [`Mounter::merge_leaf`]. Bundles are authored independently, so any name
//!    reuse is an error rather than a silent overwrite.
//! 3. **Skeleton**: the zones are placed under the fixed `DataModel` layout
//!    together with `ExternalPackages` from the vendor directory.
//!
//! The tree is serialized once, after all three stages succeed. A collision
//! anywhere means no file is written and any previous manifest is untouched.
//!
//! ## Output
//!
//! | Target | Name | File |
//! |--------|------|------|
//! | [`Target::Default`] | `<name>` | `<root>/default.project.json` |
//! | [`Target::Place`] | `<name>-<Place>` | `<places>/<Place>.project.json` |

use crate::classify;
use crate::config::{ConfigError, Layout};
use crate::merge::{MergeError, MergePolicy, Mounter};
use crate::naming;
use crate::tree::TreeNode;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_MANIFEST: &str = "default.project.json";
pub const MANIFEST_SUFFIX: &str = ".project.json";
pub const SYSTEMS_DIR: &str = "_systems";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Merge(#[from] MergeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid place name {0:?}: use letters, digits, dashes, or underscores")]
    InvalidPlaceName(String),
}

// ============================================================================
// Target
// ============================================================================

/// Which manifest to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// The single global manifest, built from the base tree only.
    Default,
    /// A per-place manifest with that place's overrides layered on.
    Place(String),
}

impl Target {
    pub fn place(name: &str) -> Result<Self, GenerateError> {
        if !naming::is_valid_place_name(name) {
            return Err(GenerateError::InvalidPlaceName(name.to_string()));
        }
        Ok(Target::Place(name.to_string()))
    }

    /// `place`, or the configured default place when none is given.
    pub fn resolve(layout: &Layout, place: Option<&str>) -> Result<Self, GenerateError> {
        Self::place(place.unwrap_or(&layout.config.default_place))
    }

    pub fn place_name(&self) -> Option<&str> {
        match self {
            Target::Default => None,
            Target::Place(name) => Some(name),
        }
    }

    pub fn manifest_path(&self, layout: &Layout) -> PathBuf {
        match self {
            Target::Default => layout.root.join(DEFAULT_MANIFEST),
            Target::Place(place) => layout.places.join(format!("{place}{MANIFEST_SUFFIX}")),
        }
    }

    pub fn manifest_name(&self, layout: &Layout) -> String {
        match self {
            Target::Default => layout.config.name.clone(),
            Target::Place(place) => format!("{}-{place}", layout.config.name),
        }
    }

    /// The override directory this target layers on, whether or not it exists.
    pub fn overlay_dir(&self, layout: &Layout) -> Option<PathBuf> {
        self.place_name().map(|place| layout.place_overrides(place))
    }
}

// ============================================================================
// Document types
// ============================================================================

/// The serialized project document.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub name: String,
    pub tree: TreeNode,
}

/// Result of building a manifest, before or after it is written.
#[derive(Debug)]
pub struct Assembly {
    pub target: Target,
    pub manifest: Manifest,
    pub manifest_path: PathBuf,
    /// Override tree that was layered on, if the place has one.
    pub overlay_root: Option<PathBuf>,
    /// System bundles merged, in merge order.
    pub systems: Vec<String>,
    /// Inputs that were expected but absent. Never fatal.
    pub missing_inputs: Vec<PathBuf>,
}

// ============================================================================
// Layout tables
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Shared,
    Server,
    Client,
}

impl Zone {
    pub fn label(self) -> &'static str {
        match self {
            Zone::Shared => "Shared",
            Zone::Server => "Server",
            Zone::Client => "Client",
        }
    }

    /// Where the zone sits in the finished tree.
    pub fn tree_path(self) -> &'static [&'static str] {
        match self {
            Zone::Shared => &["ReplicatedStorage", "Shared"],
            Zone::Server => &["ServerScriptService", "Server"],
            Zone::Client => &["StarterPlayer", "StarterPlayerScripts", "Client"],
        }
    }

    pub const ALL: [Zone; 3] = [Zone::Shared, Zone::Server, Zone::Client];
}

/// One overlayable section: node `name` in `zone`, fed from `base` under the
/// source tree and `overlay` under the place's override tree.
#[derive(Debug, Clone, Copy)]
pub struct Section {
    pub zone: Zone,
    pub name: &'static str,
    pub base: &'static str,
    pub overlay: &'static str,
}

const fn section(zone: Zone, name: &'static str, base: &'static str, overlay: &'static str) -> Section {
    Section {
        zone,
        name,
        base,
        overlay,
    }
}

/// Sections in build order.
pub const SECTIONS: &[Section] = &[
    section(Zone::Shared, "Packages", "shared/packages", "shared/packages"),
    section(Zone::Shared, "GameData", "_game_data/resolver", "shared/game_data_resolver"),
    section(Zone::Shared, "Types", "_types", "shared/types"),
    section(Zone::Shared, "Config", "shared/config", "shared/config"),
    section(Zone::Shared, "Monetisation", "_monetisation/resolver", "shared/monetisation_resolver"),
    section(Zone::Shared, "Classes", "shared/classes", "shared/classes"),
    section(Zone::Shared, "Utils", "shared/utils", "shared/utils"),
    section(Zone::Server, "Services", "server/services", "server/services"),
    section(Zone::Server, "Packages", "server/packages", "server/packages"),
    section(Zone::Server, "GameDataMaster", "_game_data/source", "server/game_data_master"),
    section(Zone::Server, "Monetisation", "_monetisation/source", "server/monetisation"),
    section(Zone::Server, "Classes", "server/classes", "server/classes"),
    section(Zone::Client, "Controllers", "client/controllers", "client/controllers"),
    section(Zone::Client, "Components", "client/components", "client/components"),
    section(Zone::Client, "Utils", "client/utils", "client/utils"),
];

/// Bootstrap scripts: same relative path in the base and override trees.
const BOOTSTRAPS: &[(Zone, &str, &str)] = &[
    (Zone::Server, "server/Bootstrap.server.luau", "Script"),
    (Zone::Client, "client/Bootstrap.client.luau", "LocalScript"),
];

pub const BOOTSTRAP_NODE: &str = "Bootstrap";

/// Asset folders, relative to a source or override root and to a bundle.
const ASSET_DIRS: &[(&str, &str)] = &[("UI", "shared/assets/ui"), ("Models", "shared/assets/models")];

/// Bundle subdirectories folded into zone sections.
const SYSTEM_PARTS: &[(Zone, &str, &str)] = &[
    (Zone::Client, "Controllers", "client/controllers"),
    (Zone::Client, "Components", "client/components"),
    (Zone::Client, "Utils", "client/utils"),
    (Zone::Server, "Services", "server/services"),
    (Zone::Server, "Packages", "server/packages"),
    (Zone::Server, "Classes", "server/classes"),
    (Zone::Shared, "Packages", "shared/packages"),
    (Zone::Shared, "Config", "shared/config"),
    (Zone::Shared, "Classes", "shared/classes"),
    (Zone::Shared, "Utils", "shared/utils"),
];

// ============================================================================
// Assembly
// ============================================================================

struct Zones {
    shared: TreeNode,
    server: TreeNode,
    client: TreeNode,
}

impl Zones {
    fn new() -> Self {
        Self {
            shared: TreeNode::folder(),
            server: TreeNode::folder(),
            client: TreeNode::folder(),
        }
    }

    fn get_mut(&mut self, zone: Zone) -> &mut TreeNode {
        match zone {
            Zone::Shared => &mut self.shared,
            Zone::Server => &mut self.server,
            Zone::Client => &mut self.client,
        }
    }
}

/// Build the manifest for `target` without touching the filesystem.
pub fn assemble(layout: &Layout, target: &Target) -> Result<Assembly, GenerateError> {
    if let Some(place) = target.place_name() {
        if !naming::is_valid_place_name(place) {
            return Err(GenerateError::InvalidPlaceName(place.to_string()));
        }
    }

    let manifest_path = target.manifest_path(layout);
    let manifest_dir = manifest_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| layout.root.clone());
    let mut mounter = Mounter::new(&manifest_dir);

    let overlay_root = match target.overlay_dir(layout) {
        Some(dir) if classify::is_directory(&dir) => Some(dir),
        Some(dir) => {
            mounter.note_missing(&dir);
            None
        }
        None => None,
    };
    info!(
        place = target.place_name().unwrap_or("<default>"),
        overlay = ?overlay_root,
        "assembling manifest"
    );

    let mut zones = Zones::new();
    build_zones(&mut mounter, &mut zones, &layout.src, overlay_root.as_deref())?;

    let mut systems = Vec::new();
    let mut roots = vec![layout.src.join(SYSTEMS_DIR)];
    if let Some(overlay) = &overlay_root {
        roots.push(overlay.join(SYSTEMS_DIR));
    }
    for root in &roots {
        systems.extend(merge_systems(&mut mounter, &mut zones, root)?);
    }

    let tree = skeleton(&mut mounter, zones, &layout.packages)?;
    Ok(Assembly {
        manifest: Manifest {
            name: target.manifest_name(layout),
            tree,
        },
        target: target.clone(),
        manifest_path,
        overlay_root,
        systems,
        missing_inputs: mounter.into_missing_inputs(),
    })
}

fn build_zones(
    mounter: &mut Mounter,
    zones: &mut Zones,
    src: &Path,
    overlay: Option<&Path>,
) -> Result<(), GenerateError> {
    for &(zone, file, class_name) in BOOTSTRAPS {
        let overlay_file = overlay.map(|root| root.join(file));
        mounter.mount_file(
            zones.get_mut(zone),
            BOOTSTRAP_NODE,
            &src.join(file),
            overlay_file.as_deref(),
            Some(class_name),
        );
    }

    for section in SECTIONS {
        let overlay_dir = overlay.map(|root| root.join(section.overlay));
        mounter.overlay_section(
            zones.get_mut(section.zone),
            section.name,
            &src.join(section.base),
            overlay_dir.as_deref(),
            section.zone.label(),
        )?;
    }

    let assets = zones.shared.ensure_folder("Assets");
    for &(name, rel) in ASSET_DIRS {
        let location = format!("Shared.Assets.{name}");
        let dest = assets.ensure_folder(name);
        mounter.merge_assets(dest, &src.join(rel), MergePolicy::Replace, &location)?;
        if let Some(overlay) = overlay {
            mounter.merge_assets(dest, &overlay.join(rel), MergePolicy::Replace, &location)?;
        }
    }
    Ok(())
}

/// Fold every bundle under `systems_root` into the zones, returning the
/// bundle names in merge order. A missing root contributes nothing.
fn merge_systems(
    mounter: &mut Mounter,
    zones: &mut Zones,
    systems_root: &Path,
) -> Result<Vec<String>, GenerateError> {
    if !classify::is_directory(systems_root) {
        return Ok(Vec::new());
    }

    let mut merged = Vec::new();
    for bundle in classify::list_entries(systems_root)? {
        if !bundle.is_dir {
            continue;
        }
        debug!(system = %bundle.name, path = %bundle.path.display(), "merging system");

        for &(zone, name, rel) in SYSTEM_PARTS {
            let location = format!("{}.{name}", zone.label());
            let dest = zones.get_mut(zone).ensure_folder(name);
            mounter.merge_leaf(dest, &bundle.path.join(rel), &location)?;
        }

        let assets = zones.shared.ensure_folder("Assets");
        for &(name, rel) in ASSET_DIRS {
            let location = format!("Shared.Assets.{name}");
            let dest = assets.ensure_folder(name);
            mounter.merge_assets(dest, &bundle.path.join(rel), MergePolicy::FailOnCollision, &location)?;
        }

        merged.push(bundle.name);
    }
    Ok(merged)
}

/// Place the zones into the fixed `DataModel` layout.
fn skeleton(mounter: &mut Mounter, zones: Zones, packages: &Path) -> Result<TreeNode, GenerateError> {
    let mut external = TreeNode::folder();
    mounter.mount_vendor_packages(&mut external, packages)?;

    let mut replicated = TreeNode::container(None);
    replicated.insert(Zone::Shared.label(), zones.shared);
    replicated.insert("ExternalPackages", external);

    let mut server_scripts = TreeNode::container(None);
    server_scripts.insert(Zone::Server.label(), zones.server);

    let mut player_scripts = TreeNode::container(None);
    player_scripts.insert(Zone::Client.label(), zones.client);
    let mut starter_player = TreeNode::container(None);
    starter_player.insert("StarterPlayerScripts", player_scripts);

    let mut root = TreeNode::container(Some("DataModel"));
    root.insert("ReplicatedStorage", replicated);
    root.insert("ServerScriptService", server_scripts);
    root.insert("StarterPlayer", starter_player);
    Ok(root)
}

// ============================================================================
// Writing
// ============================================================================

/// Serialize `manifest` as 2-space pretty JSON, replacing any existing file.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<(), GenerateError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

/// Assemble and write the manifest for `target`.
pub fn generate(layout: &Layout, target: &Target) -> Result<Assembly, GenerateError> {
    let assembly = assemble(layout, target)?;
    write_manifest(&assembly.manifest_path, &assembly.manifest)?;
    info!(path = %assembly.manifest_path.display(), "manifest written");
    Ok(assembly)
}

/// Generate the manifest only if its file does not exist yet.
///
/// Returns the assembly when a file was written.
pub fn ensure_manifest(layout: &Layout, target: &Target) -> Result<Option<Assembly>, GenerateError> {
    if target.manifest_path(layout).is_file() {
        return Ok(None);
    }
    generate(layout, target).map(Some)
}

// ============================================================================
// Place discovery
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceInfo {
    pub name: String,
    pub has_overrides: bool,
    pub manifest: Option<PathBuf>,
}

/// Places known from override directories and generated manifests, by name.
pub fn known_places(layout: &Layout) -> Result<Vec<PlaceInfo>, GenerateError> {
    let mut places: BTreeMap<String, PlaceInfo> = BTreeMap::new();

    if classify::is_directory(&layout.overrides) {
        for e in classify::list_entries(&layout.overrides)? {
            if e.is_dir && naming::is_valid_place_name(&e.name) {
                place_slot(&mut places, &e.name).has_overrides = true;
            }
        }
    }

    if classify::is_directory(&layout.places) {
        for e in classify::list_entries(&layout.places)? {
            let Some(place) = e.name.strip_suffix(MANIFEST_SUFFIX) else {
                continue;
            };
            if e.is_file && e.name != DEFAULT_MANIFEST && naming::is_valid_place_name(place) {
                place_slot(&mut places, place).manifest = Some(e.path.clone());
            }
        }
    }

    Ok(places.into_values().collect())
}

fn place_slot<'a>(places: &'a mut BTreeMap<String, PlaceInfo>, name: &str) -> &'a mut PlaceInfo {
    places.entry(name.to_string()).or_insert_with(|| PlaceInfo {
        name: name.to_string(),
        has_overrides: false,
        manifest: None,
    })
}
