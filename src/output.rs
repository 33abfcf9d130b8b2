//! CLI output formatting for every command.
//!
//! # Information-First Display
//!
//! Output leads with what the user thinks in (places, zones, sections, system
//! bundles) and shows filesystem paths as indented context lines. Paths are
//! always relative to the repository root.
//!
//! # Output Format
//!
//! ## gen
//!
//! ```text
//! woolly-Lobby → places/Lobby.project.json
//!     Overrides: place_overrides/Lobby
//! Shared
//!     001 Assets (2 mounted)
//!     002 Config (3 mounted)
//! Server
//!     001 Bootstrap → ../src/server/Bootstrap.server.luau
//!     002 Services (5 mounted)
//! Client
//!     001 Controllers (2 mounted)
//! Systems
//!     001 combat
//! External packages: 4
//! Missing (skipped)
//!     src/_types
//! Generated 3 zones, 1 system, 16 mounted paths
//! ```
//!
//! ## create
//!
//! ```text
//! Created src/server/services/LootDrop.luau
//! Exists  src/shared/config/Shop.luau
//! Created 13 directories
//! ```
//!
//! ## list
//!
//! ```text
//! Places
//! 001 Arena
//!     Overrides: place_overrides/Arena
//!     Manifest: places/Arena.project.json
//! 002 MainPlace (default)
//!     Overrides: none
//!     Manifest: not generated
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::config::Layout;
use crate::manifest::{Assembly, PlaceInfo, Zone};
use crate::scaffold::{Scaffold, Written};
use crate::tree::TreeNode;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

/// One section line: leaves show their path, containers their size.
///
/// ```text
/// 001 Bootstrap → ../src/server/Bootstrap.server.luau
/// 002 Services (5 mounted)
/// ```
fn section_line(index: usize, name: &str, node: &TreeNode) -> String {
    match (&node.path, node.children.is_empty()) {
        (Some(path), true) => format!("{} {} \u{2192} {}", format_index(index), name, path),
        _ => format!(
            "{} {} ({} mounted)",
            format_index(index),
            name,
            node.mounted_count()
        ),
    }
}

// ============================================================================
// gen
// ============================================================================

/// Format the result of assembling (and writing) one manifest.
pub fn format_generate_output(assembly: &Assembly, layout: &Layout) -> Vec<String> {
    let mut lines = Vec::new();
    let tree = &assembly.manifest.tree;

    lines.push(format!(
        "{} \u{2192} {}",
        assembly.manifest.name,
        layout.display(&assembly.manifest_path)
    ));
    if let Some(overlay) = &assembly.overlay_root {
        lines.push(format!("{}Overrides: {}", indent(1), layout.display(overlay)));
    }

    let mut zone_count = 0;
    for zone in Zone::ALL {
        let Some(node) = tree.get(zone.tree_path()) else {
            continue;
        };
        zone_count += 1;
        lines.push(zone.label().to_string());
        for (i, (name, child)) in node.children.iter().enumerate() {
            lines.push(format!("{}{}", indent(1), section_line(i + 1, name, child)));
        }
    }

    if !assembly.systems.is_empty() {
        lines.push("Systems".to_string());
        for (i, system) in assembly.systems.iter().enumerate() {
            lines.push(format!("{}{} {}", indent(1), format_index(i + 1), system));
        }
    }

    let external = tree
        .get(&["ReplicatedStorage", "ExternalPackages"])
        .map_or(0, |n| n.children.len());
    lines.push(format!("External packages: {external}"));

    if !assembly.missing_inputs.is_empty() {
        lines.push("Missing (skipped)".to_string());
        for path in &assembly.missing_inputs {
            lines.push(format!("{}{}", indent(1), layout.display(path)));
        }
    }

    lines.push(format!(
        "Generated {}, {}, {}",
        plural(zone_count, "zone", "zones"),
        plural(assembly.systems.len(), "system", "systems"),
        plural(tree.mounted_count(), "mounted path", "mounted paths"),
    ));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(assembly: &Assembly, layout: &Layout) {
    for line in format_generate_output(assembly, layout) {
        println!("{}", line);
    }
}

// ============================================================================
// create / setup skeletons
// ============================================================================

/// Format the files and directories a scaffold call touched.
pub fn format_scaffold_output(scaffold: &Scaffold, layout: &Layout) -> Vec<String> {
    let mut lines: Vec<String> = scaffold
        .files
        .iter()
        .map(|written| {
            let label = match written {
                Written::Created(_) => "Created",
                Written::Exists(_) => "Exists ",
            };
            format!("{} {}", label, layout.display(written.path()))
        })
        .collect();

    if !scaffold.dirs.is_empty() {
        lines.push(format!(
            "Created {}",
            plural(scaffold.dirs.len(), "directory", "directories")
        ));
    }
    if lines.is_empty() {
        lines.push("Nothing to do".to_string());
    }
    lines
}

/// Print scaffold output to stdout.
pub fn print_scaffold_output(scaffold: &Scaffold, layout: &Layout) {
    for line in format_scaffold_output(scaffold, layout) {
        println!("{}", line);
    }
}

// ============================================================================
// list
// ============================================================================

/// Format known places, marking the default. The default place is always
/// listed, even before anything exists for it.
pub fn format_places(places: &[PlaceInfo], default_place: &str, layout: &Layout) -> Vec<String> {
    let mut all: Vec<PlaceInfo> = places.to_vec();
    if !all.iter().any(|p| p.name == default_place) {
        all.push(PlaceInfo {
            name: default_place.to_string(),
            has_overrides: false,
            manifest: None,
        });
        all.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let mut lines = vec!["Places".to_string()];
    for (i, place) in all.iter().enumerate() {
        let marker = if place.name == default_place { " (default)" } else { "" };
        lines.push(format!("{} {}{}", format_index(i + 1), place.name, marker));

        let overrides = if place.has_overrides {
            layout.display(&layout.place_overrides(&place.name))
        } else {
            "none".to_string()
        };
        lines.push(format!("{}Overrides: {}", indent(1), overrides));

        let manifest = place
            .manifest
            .as_deref()
            .map_or_else(|| "not generated".to_string(), |p| layout.display(p));
        lines.push(format!("{}Manifest: {}", indent(1), manifest));
    }
    lines
}

/// Print the place list to stdout.
pub fn print_places(places: &[PlaceInfo], default_place: &str, layout: &Layout) {
    for line in format_places(places, default_place, layout) {
        println!("{}", line);
    }
}

// ============================================================================
// switch
// ============================================================================

pub fn format_switch_output(place: &str, config_path: &Path, layout: &Layout) -> Vec<String> {
    vec![
        format!("Default place \u{2192} {place}"),
        format!("{}Updated {}", indent(1), layout.display(config_path)),
    ]
}

pub fn print_switch_output(place: &str, config_path: &Path, layout: &Layout) {
    for line in format_switch_output(place, config_path, layout) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
