//! Shared test utilities for the woolly test suite.
//!
//! Provides fixture writers for throwaway repositories and lookup helpers for
//! the generated tree. Lookups panic with the available names on a miss, so a
//! failing test says what *was* there.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let (tmp, layout) = project(&[
//!     "src/shared/config/A.luau",
//!     "src/_systems/combat/shared/config/B.luau",
//! ]);
//! let assembly = assemble(&layout, &Target::Default).unwrap();
//!
//! let config = find_node(&assembly.manifest.tree, "ReplicatedStorage.Shared.Config");
//! assert_eq!(child_names(config), vec!["A", "B"]);
//! ```

use std::fs;
use std::path::Path;
use tempfile::TempDir;

use crate::config::Layout;
use crate::tree::TreeNode;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding the given relative paths.
///
/// Paths ending in `/` become empty directories; everything else becomes a
/// file whose content names its own path (so overlay and base copies differ).
pub fn write_tree(paths: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_into(tmp.path(), paths);
    tmp
}

pub fn write_into(root: &Path, paths: &[&str]) {
    for rel in paths {
        let abs = root.join(rel.trim_end_matches('/'));
        if rel.ends_with('/') {
            fs::create_dir_all(&abs).unwrap();
        } else {
            fs::create_dir_all(abs.parent().unwrap()).unwrap();
            fs::write(&abs, format!("-- {rel}\nreturn {{}}\n")).unwrap();
        }
    }
}

/// A throwaway repository with default config and the given files.
pub fn project(paths: &[&str]) -> (TempDir, Layout) {
    let tmp = write_tree(paths);
    let layout = Layout::load(tmp.path()).unwrap();
    (tmp, layout)
}

// =========================================================================
// Tree lookups: panic with a clear message on miss
// =========================================================================

/// Find a descendant by dotted path (`"ReplicatedStorage.Shared.Config"`).
pub fn find_node<'a>(root: &'a TreeNode, dotted: &str) -> &'a TreeNode {
    let mut node = root;
    let mut walked = Vec::new();
    for name in dotted.split('.') {
        node = node.child(name).unwrap_or_else(|| {
            let available = child_names(node);
            panic!(
                "node '{name}' not found under '{}'. Available: {available:?}",
                walked.join(".")
            )
        });
        walked.push(name);
    }
    node
}

/// Child names in manifest order.
pub fn child_names(node: &TreeNode) -> Vec<&str> {
    node.children.keys().map(String::as_str).collect()
}

/// The `$path` of a descendant. Panics if the node has none.
pub fn path_of<'a>(root: &'a TreeNode, dotted: &str) -> &'a str {
    find_node(root, dotted)
        .path
        .as_deref()
        .unwrap_or_else(|| panic!("node '{dotted}' has no $path"))
}
