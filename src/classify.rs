//! Path classification for the source tree.
//!
//! Every decision the merge engine makes about a filesystem entry comes from
//! this module: whether it is a module source file, a binary model asset, or a
//! folder-backed module (a directory promoted to a single node by its `init`
//! entry file).
//!
//! | Kind | Recognized by |
//! |------|---------------|
//! | Module file | `.luau` / `.lua` extension (case-insensitive) |
//! | Asset file | `.rbxm` / `.rbxmx` extension (case-insensitive) |
//! | Folder-backed module | directory containing `init.luau` or `init.lua` |
//!
//! Predicates never fail: a path that does not exist, or cannot be read, is
//! simply not a directory, not a file and not a module.

use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const MODULE_EXTENSIONS: &[&str] = &["luau", "lua"];
pub const ASSET_EXTENSIONS: &[&str] = &["rbxm", "rbxmx"];

/// Stem of the reserved entry file that promotes its directory to a module.
pub const ENTRY_STEM: &str = "init";

pub fn is_directory(path: &Path) -> bool {
    path.is_dir()
}

pub fn is_file(path: &Path) -> bool {
    path.is_file()
}

fn has_extension(name: &str, extensions: &[&str]) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

pub fn is_module_file(name: &str) -> bool {
    has_extension(name, MODULE_EXTENSIONS)
}

pub fn is_asset_file(name: &str) -> bool {
    has_extension(name, ASSET_EXTENSIONS)
}

/// Remove one trailing module or asset extension.
///
/// - `Foo.luau` / `Foo.lua` → `Foo`
/// - `Foo.rbxm` / `Foo.RBXMX` → `Foo`
/// - `Bootstrap.server.luau` → `Bootstrap.server`
/// - `README.md` → `README.md` (unrecognized, unchanged)
pub fn strip_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, _)) if is_module_file(name) || is_asset_file(name) => stem,
        _ => name,
    }
}

/// True if `dir` is a directory holding an `init` file with a module extension.
///
/// Only the entry file is checked; the rest of the directory is the downstream
/// tool's business.
pub fn is_folder_backed_module(dir: &Path) -> bool {
    if !is_directory(dir) {
        return false;
    }
    match list_entries(dir) {
        Ok(entries) => entries
            .iter()
            .any(|e| e.is_file && is_module_file(&e.name) && strip_extension(&e.name) == ENTRY_STEM),
        Err(_) => false,
    }
}

/// A directory entry as seen by the merge engine.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    pub name: String,
    pub is_dir: bool,
    pub is_file: bool,
}

/// List the immediate children of `dir`, sorted by file name.
///
/// Hidden entries (leading `.`) are skipped. Symlinks are followed so a linked
/// directory classifies like a real one; a dangling link is skipped. Sorting makes every traversal, and
/// therefore every manifest, identical across platforms.
pub fn list_entries(dir: &Path) -> io::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if is_broken_link(&err) => {
                debug!(path = ?err.path(), "skipping dangling link");
                continue;
            }
            Err(err) => return Err(io::Error::from(err)),
        };
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type();
        entries.push(Entry {
            path: entry.path().to_path_buf(),
            name,
            is_dir: file_type.is_dir(),
            is_file: file_type.is_file(),
        });
    }
    Ok(entries)
}

fn is_broken_link(err: &walkdir::Error) -> bool {
    err.depth() == 1
        && err
            .io_error()
            .is_some_and(|e| e.kind() == io::ErrorKind::NotFound)
}
