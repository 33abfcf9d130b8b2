//! Mirror/merge engine: copies the shape of a source directory into a
//! destination node of the output tree.
//!
//! All three historical operations run through one recursive function,
//! [`Mounter::merge_dir`], parameterized by:
//!
//! - [`MergePolicy`]: what to do when a name already exists in the destination.
//!   `Replace` overwrites the old entry in full; `FailOnCollision` aborts.
//! - [`FileClass`]: which files become leaves. Module sources (`.luau`/`.lua`)
//!   or binary model assets (`.rbxm`/`.rbxmx`).
//!
//! | Operation | Policy | Used for |
//! |-----------|--------|----------|
//! | [`Mounter::mirror`] | `Replace` | base source sections, mounted once per destination |
//! | [`Mounter::merge_leaf`] | `FailOnCollision` | independently authored system bundles |
//! | [`Mounter::overlay_section`] | base mirror, then `Replace` | per-place overrides |
//!
//! ## Shape rules
//!
//! - A directory with an `init` entry file is mounted as one folder-backed
//!   module under its normalized name, and recursion stops there.
//! - Any other directory finds or creates a container under its normalized
//!   name and is recursed into.
//! - A matching file becomes a leaf named after its file name minus extension.
//!   File stems are not normalized; they already are the exported identifier.
//!
//! Asset mirroring never promotes folders: model directories are always plain
//! containers.
//!
//! Entries are visited in sorted order, so which write wins a `Replace`
//! collision is the same on every platform.

use crate::classify::{self, Entry};
use crate::naming;
use crate::tree::TreeNode;
use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Name collision merging systems: {name} already exists in {location} (from {})", .origin.display())]
    Collision {
        location: String,
        name: String,
        origin: PathBuf,
    },
    #[error("Asset name collision: {name} already exists in {location} (from {})", .origin.display())]
    AssetCollision {
        location: String,
        name: String,
        origin: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
    /// A later write replaces the existing entry in full.
    Replace,
    /// An existing name is a fatal authoring error.
    FailOnCollision,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileClass {
    Modules,
    Assets,
}

impl FileClass {
    fn accepts(self, name: &str) -> bool {
        match self {
            FileClass::Modules => classify::is_module_file(name),
            FileClass::Assets => classify::is_asset_file(name),
        }
    }

    fn leaf(self, path: String) -> TreeNode {
        match self {
            FileClass::Modules => TreeNode::module(path),
            FileClass::Assets => TreeNode::asset(path),
        }
    }

    fn promotes_folders(self) -> bool {
        self == FileClass::Modules
    }

    fn collision(self, location: &str, name: &str, origin: &Path) -> MergeError {
        let (location, name, origin) = (location.to_string(), name.to_string(), origin.to_path_buf());
        match self {
            FileClass::Modules => MergeError::Collision {
                location,
                name,
                origin,
            },
            FileClass::Assets => MergeError::AssetCollision {
                location,
                name,
                origin,
            },
        }
    }
}

/// Express `target` relative to `from_dir` with `/` separators.
///
/// Both paths are made absolute against the working directory first, so
/// mixed relative/absolute inputs resolve consistently.
pub fn relative_posix(from_dir: &Path, target: &Path) -> String {
    let from = absolutize(from_dir);
    let to = absolutize(target);
    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(&to_parts)
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = vec!["..".to_string(); from_parts.len() - common];
    parts.extend(
        to_parts[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );

    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

fn absolutize(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Mount `node` under `name`, honoring the collision policy.
fn place(
    dest: &mut TreeNode,
    name: String,
    node: TreeNode,
    policy: MergePolicy,
    files: FileClass,
    location: &str,
    origin: &Path,
) -> Result<(), MergeError> {
    if policy == MergePolicy::FailOnCollision && dest.contains(&name) {
        return Err(files.collision(location, &name, origin));
    }
    dest.insert(name, node);
    Ok(())
}

/// Find or create the container a subdirectory recurses into.
///
/// Reusing an existing container is how bundles contribute into a shared
/// section; finding a leaf there instead is a collision under `FailOnCollision`.
fn descend<'a>(
    dest: &'a mut TreeNode,
    name: &str,
    policy: MergePolicy,
    files: FileClass,
    location: &str,
    origin: &Path,
) -> Result<&'a mut TreeNode, MergeError> {
    if policy == MergePolicy::FailOnCollision
        && dest.child(name).is_some_and(|existing| !existing.accepts_children())
    {
        return Err(files.collision(location, name, origin));
    }
    Ok(dest.ensure_folder(name))
}

/// Builds tree nodes whose `$path`s are relative to the manifest's directory.
///
/// Also records every section input that was asked for but does not exist.
/// Those are warnings only; the section is simply left out.
#[derive(Debug)]
pub struct Mounter {
    manifest_dir: PathBuf,
    missing: Vec<PathBuf>,
}

impl Mounter {
    pub fn new(manifest_dir: &Path) -> Self {
        Self {
            manifest_dir: manifest_dir.to_path_buf(),
            missing: Vec::new(),
        }
    }

    pub fn source_path(&self, abs: &Path) -> String {
        relative_posix(&self.manifest_dir, abs)
    }

    pub fn missing_inputs(&self) -> &[PathBuf] {
        &self.missing
    }

    pub fn into_missing_inputs(self) -> Vec<PathBuf> {
        self.missing
    }

    pub fn note_missing(&mut self, path: &Path) {
        debug!(path = %path.display(), "input missing, section omitted");
        self.missing.push(path.to_path_buf());
    }

    /// Copy `src`'s module shape into `dest`, overwriting silently.
    pub fn mirror(&mut self, dest: &mut TreeNode, src: &Path, location: &str) -> Result<(), MergeError> {
        self.merge_dir(dest, src, MergePolicy::Replace, FileClass::Modules, location)
    }

    /// Fold a system bundle's section into `dest`. Any name reuse is fatal.
    pub fn merge_leaf(&mut self, dest: &mut TreeNode, src: &Path, location: &str) -> Result<(), MergeError> {
        self.merge_dir(dest, src, MergePolicy::FailOnCollision, FileClass::Modules, location)
    }

    pub fn merge_assets(
        &mut self,
        dest: &mut TreeNode,
        src: &Path,
        policy: MergePolicy,
        location: &str,
    ) -> Result<(), MergeError> {
        self.merge_dir(dest, src, policy, FileClass::Assets, location)
    }

    /// The shared recursion behind every mirror/merge operation.
    ///
    /// A missing or non-directory `src` contributes nothing.
    pub fn merge_dir(
        &mut self,
        dest: &mut TreeNode,
        src: &Path,
        policy: MergePolicy,
        files: FileClass,
        location: &str,
    ) -> Result<(), MergeError> {
        if !classify::is_directory(src) {
            return Ok(());
        }

        if files.promotes_folders() && classify::is_folder_backed_module(src) {
            let name = naming::normalize(&dir_name(src));
            debug!(path = %src.display(), %name, "mounting folder-backed module");
            let node = TreeNode::folder_module(self.source_path(src));
            return place(dest, name, node, policy, files, location, src);
        }

        for entry in classify::list_entries(src)? {
            self.merge_entry(dest, &entry, policy, files, location)?;
        }
        Ok(())
    }

    fn merge_entry(
        &mut self,
        dest: &mut TreeNode,
        entry: &Entry,
        policy: MergePolicy,
        files: FileClass,
        location: &str,
    ) -> Result<(), MergeError> {
        if entry.is_dir {
            let name = naming::normalize(&entry.name);
            if name.is_empty() {
                debug!(path = %entry.path.display(), "skipping directory with no usable name");
                return Ok(());
            }
            if files.promotes_folders() && classify::is_folder_backed_module(&entry.path) {
                debug!(path = %entry.path.display(), %name, "mounting folder-backed module");
                let node = TreeNode::folder_module(self.source_path(&entry.path));
                return place(dest, name, node, policy, files, location, &entry.path);
            }
            let child_location = format!("{location}.{name}");
            let child = descend(dest, &name, policy, files, location, &entry.path)?;
            return self.merge_dir(child, &entry.path, policy, files, &child_location);
        }

        if entry.is_file && files.accepts(&entry.name) {
            let name = classify::strip_extension(&entry.name).to_string();
            let node = files.leaf(self.source_path(&entry.path));
            return place(dest, name, node, policy, files, location, &entry.path);
        }

        Ok(())
    }

    /// Mount section `name` from `base`, then let `overlay` add to or replace it.
    ///
    /// - folder-backed base → one module node; plain base → mirrored container;
    ///   missing base → nothing.
    /// - folder-backed overlay → replaces the whole section.
    /// - plain overlay → merged in, replacing same-named base entries.
    pub fn overlay_section(
        &mut self,
        parent: &mut TreeNode,
        name: &str,
        base: &Path,
        overlay: Option<&Path>,
        location: &str,
    ) -> Result<(), MergeError> {
        let section_location = format!("{location}.{name}");
        let overlay = overlay.filter(|dir| classify::is_directory(dir));

        if classify::is_folder_backed_module(base) {
            parent.insert(name, TreeNode::folder_module(self.source_path(base)));
        } else if classify::is_directory(base) {
            let section = parent.ensure_folder(name);
            self.mirror(section, base, &section_location)?;
        } else if overlay.is_none() {
            self.note_missing(base);
            return Ok(());
        }

        let Some(overlay) = overlay else {
            return Ok(());
        };

        if classify::is_folder_backed_module(overlay) {
            debug!(path = %overlay.display(), %name, "overlay replaces section");
            parent.insert(name, TreeNode::folder_module(self.source_path(overlay)));
            return Ok(());
        }

        let section = parent.ensure_folder(name);
        self.merge_dir(
            section,
            overlay,
            MergePolicy::Replace,
            FileClass::Modules,
            &section_location,
        )
    }

    /// Mount a single script file, preferring the overlay copy.
    pub fn mount_file(
        &mut self,
        parent: &mut TreeNode,
        name: &str,
        base: &Path,
        overlay: Option<&Path>,
        class_name: Option<&str>,
    ) {
        let chosen = overlay
            .filter(|file| classify::is_file(file))
            .or_else(|| Some(base).filter(|file| classify::is_file(file)));

        match chosen {
            Some(file) => {
                let mut node = TreeNode::module(self.source_path(file));
                if let Some(class_name) = class_name {
                    node = node.with_class_name(class_name);
                }
                parent.insert(name, node);
            }
            None => self.note_missing(base),
        }
    }

    /// Mount every vendor package under `dest`, keeping raw package names.
    ///
    /// Entries starting with `_` are the package manager's internals and are
    /// skipped. Directories are mounted by path (the downstream tool expands
    /// them); loose module files become module leaves.
    pub fn mount_vendor_packages(&mut self, dest: &mut TreeNode, packages_dir: &Path) -> Result<(), MergeError> {
        if !classify::is_directory(packages_dir) {
            self.note_missing(packages_dir);
            return Ok(());
        }

        for entry in classify::list_entries(packages_dir)? {
            if entry.name.starts_with('_') {
                continue;
            }
            if entry.is_dir {
                dest.insert(entry.name.clone(), TreeNode::folder_module(self.source_path(&entry.path)));
            } else if entry.is_file && classify::is_module_file(&entry.name) {
                let name = classify::strip_extension(&entry.name).to_string();
                dest.insert(name, TreeNode::module(self.source_path(&entry.path)));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use crate::tree::NodeKind;

    #[test]
    fn relative_posix_walks_up_and_down() {
        assert_eq!(
            relative_posix(Path::new("/repo/places"), Path::new("/repo/src/shared/A.luau")),
            "../src/shared/A.luau"
        );
        assert_eq!(
            relative_posix(Path::new("/repo"), Path::new("/repo/src/shared")),
            "src/shared"
        );
        assert_eq!(relative_posix(Path::new("/repo"), Path::new("/repo")), ".");
    }

    #[test]
    fn mirror_builds_containers_and_leaves() {
        let tmp = write_tree(&[
            "utils/Math.luau",
            "utils/legacy.lua",
            "utils/readme.md",
            "utils/table_ext/Deep.luau",
        ]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .mirror(&mut dest, &tmp.path().join("utils"), "Client.Utils")
            .unwrap();

        assert_eq!(child_names(&dest), vec!["Math", "TableExt", "legacy"]);
        assert_eq!(find_node(&dest, "Math").path.as_deref(), Some("utils/Math.luau"));
        assert_eq!(
            find_node(&dest, "TableExt.Deep").path.as_deref(),
            Some("utils/table_ext/Deep.luau")
        );
    }

    #[test]
    fn unnameable_directories_skipped() {
        let tmp = write_tree(&["utils/-_-/Lost.luau", "utils/--/Gone.luau", "utils/Kept.luau"]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .mirror(&mut dest, &tmp.path().join("utils"), "Shared.Utils")
            .unwrap();

        assert_eq!(child_names(&dest), vec!["Kept"]);
    }

    #[test]
    fn folder_backed_subdirectory_promoted() {
        let tmp = write_tree(&["services/Foo/init.luau", "services/Foo/Bar.luau"]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .mirror(&mut dest, &tmp.path().join("services"), "Server.Services")
            .unwrap();

        assert_eq!(child_names(&dest), vec!["Foo"]);
        let foo = find_node(&dest, "Foo");
        assert_eq!(foo.kind, NodeKind::FolderModule);
        assert_eq!(foo.path.as_deref(), Some("services/Foo"));
        assert!(foo.children.is_empty());
    }

    #[test]
    fn folder_backed_source_mounted_under_its_own_name() {
        let tmp = write_tree(&["combat_kit/init.luau"]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .mirror(&mut dest, &tmp.path().join("combat_kit"), "Shared")
            .unwrap();

        assert_eq!(child_names(&dest), vec!["CombatKit"]);
    }

    #[test]
    fn merge_leaf_collision_is_fatal() {
        let tmp = write_tree(&["a/C.luau", "b/C.luau"]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .merge_leaf(&mut dest, &tmp.path().join("a"), "Server.Services")
            .unwrap();
        let err = mounter
            .merge_leaf(&mut dest, &tmp.path().join("b"), "Server.Services")
            .unwrap_err();

        match err {
            MergeError::Collision { location, name, .. } => {
                assert_eq!(location, "Server.Services");
                assert_eq!(name, "C");
            }
            other => panic!("expected collision, got {other:?}"),
        }
    }

    #[test]
    fn merge_leaf_folder_module_collision_is_fatal() {
        let tmp = write_tree(&["a/Inventory/init.luau", "b/inventory/init.lua"]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .merge_leaf(&mut dest, &tmp.path().join("a"), "Client.Controllers")
            .unwrap();
        let err = mounter
            .merge_leaf(&mut dest, &tmp.path().join("b"), "Client.Controllers")
            .unwrap_err();
        assert!(err.to_string().contains("Inventory"));
        assert!(err.to_string().contains("Client.Controllers"));
    }

    #[test]
    fn merge_leaf_shares_plain_subfolders() {
        let tmp = write_tree(&["a/combat/Sword.luau", "b/combat/Bow.luau"]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter.merge_leaf(&mut dest, &tmp.path().join("a"), "S").unwrap();
        mounter.merge_leaf(&mut dest, &tmp.path().join("b"), "S").unwrap();

        assert_eq!(child_names(find_node(&dest, "Combat")), vec!["Bow", "Sword"]);
    }

    #[test]
    fn merge_leaf_nested_collision_reports_nested_location() {
        let tmp = write_tree(&["a/combat/Sword.luau", "b/combat/Sword.luau"]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter.merge_leaf(&mut dest, &tmp.path().join("a"), "Shared.Classes").unwrap();
        let err = mounter
            .merge_leaf(&mut dest, &tmp.path().join("b"), "Shared.Classes")
            .unwrap_err();
        assert!(matches!(
            err,
            MergeError::Collision { ref location, .. } if location == "Shared.Classes.Combat"
        ));
    }

    #[test]
    fn directory_over_leaf_is_collision() {
        let tmp = write_tree(&["a/Thing.luau", "b/thing/Inner.luau"]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter.merge_leaf(&mut dest, &tmp.path().join("a"), "X").unwrap();
        let err = mounter.merge_leaf(&mut dest, &tmp.path().join("b"), "X");
        assert!(matches!(err, Err(MergeError::Collision { .. })));
    }

    #[test]
    fn assets_never_promote_and_collide_as_assets() {
        let tmp = write_tree(&[
            "a/weapons/init.luau",
            "a/weapons/Sword.rbxm",
            "b/weapons/Sword.rbxmx",
        ]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .merge_assets(&mut dest, &tmp.path().join("a"), MergePolicy::FailOnCollision, "Shared.Assets.Models")
            .unwrap();

        let weapons = find_node(&dest, "Weapons");
        assert_eq!(weapons.kind, NodeKind::Container);
        assert_eq!(child_names(weapons), vec!["Sword"]);
        assert_eq!(find_node(&dest, "Weapons.Sword").kind, NodeKind::Asset);

        let err = mounter
            .merge_assets(&mut dest, &tmp.path().join("b"), MergePolicy::FailOnCollision, "Shared.Assets.Models")
            .unwrap_err();
        assert!(matches!(err, MergeError::AssetCollision { ref name, .. } if name == "Sword"));
    }

    #[test]
    fn overlay_replaces_single_file() {
        let tmp = write_tree(&["base/A.luau", "base/B.luau", "over/A.luau", "over/New.luau"]);
        let mut parent = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .overlay_section(
                &mut parent,
                "Config",
                &tmp.path().join("base"),
                Some(&tmp.path().join("over")),
                "Shared",
            )
            .unwrap();

        let config = find_node(&parent, "Config");
        assert_eq!(child_names(config), vec!["A", "B", "New"]);
        assert_eq!(find_node(config, "A").path.as_deref(), Some("over/A.luau"));
        assert_eq!(find_node(config, "B").path.as_deref(), Some("base/B.luau"));
    }

    #[test]
    fn folder_backed_overlay_replaces_whole_section() {
        let tmp = write_tree(&["base/A.luau", "over/init.luau"]);
        let mut parent = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .overlay_section(
                &mut parent,
                "Config",
                &tmp.path().join("base"),
                Some(&tmp.path().join("over")),
                "Shared",
            )
            .unwrap();

        let config = find_node(&parent, "Config");
        assert_eq!(config.kind, NodeKind::FolderModule);
        assert_eq!(config.path.as_deref(), Some("over"));
        assert!(config.children.is_empty());
    }

    #[test]
    fn plain_overlay_adds_into_folder_backed_base() {
        let tmp = write_tree(&["base/init.luau", "over/Extra.luau"]);
        let mut parent = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .overlay_section(
                &mut parent,
                "Config",
                &tmp.path().join("base"),
                Some(&tmp.path().join("over")),
                "Shared",
            )
            .unwrap();

        let config = find_node(&parent, "Config");
        assert_eq!(config.kind, NodeKind::FolderModule);
        assert_eq!(config.path.as_deref(), Some("base"));
        assert_eq!(child_names(config), vec!["Extra"]);
    }

    #[test]
    fn missing_base_and_overlay_is_recorded_not_fatal() {
        let tmp = write_tree(&[]);
        let mut parent = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        let base = tmp.path().join("nope");
        mounter
            .overlay_section(&mut parent, "Utils", &base, None, "Client")
            .unwrap();

        assert!(!parent.contains("Utils"));
        assert_eq!(mounter.missing_inputs(), &[base]);
    }

    #[test]
    fn overlay_only_section_is_mounted() {
        let tmp = write_tree(&["over/OnlyHere.luau"]);
        let mut parent = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .overlay_section(
                &mut parent,
                "Utils",
                &tmp.path().join("missing"),
                Some(&tmp.path().join("over")),
                "Client",
            )
            .unwrap();

        assert_eq!(child_names(find_node(&parent, "Utils")), vec!["OnlyHere"]);
        assert!(mounter.missing_inputs().is_empty());
    }

    #[test]
    fn mount_file_prefers_overlay() {
        let tmp = write_tree(&["base/Bootstrap.server.luau", "over/Bootstrap.server.luau"]);
        let mut parent = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter.mount_file(
            &mut parent,
            "Bootstrap",
            &tmp.path().join("base/Bootstrap.server.luau"),
            Some(&tmp.path().join("over/Bootstrap.server.luau")),
            Some("Script"),
        );

        let boot = find_node(&parent, "Bootstrap");
        assert_eq!(boot.path.as_deref(), Some("over/Bootstrap.server.luau"));
        assert_eq!(boot.class_name.as_deref(), Some("Script"));
    }

    #[test]
    fn vendor_packages_skip_internals_and_keep_raw_names() {
        let tmp = write_tree(&[
            "Packages/_Index/whatever/init.lua",
            "Packages/promise/init.lua",
            "Packages/signal_lib/Signal.luau",
            "Packages/Trove.lua",
            "Packages/notes.txt",
        ]);
        let mut dest = TreeNode::folder();
        let mut mounter = Mounter::new(tmp.path());
        mounter
            .mount_vendor_packages(&mut dest, &tmp.path().join("Packages"))
            .unwrap();

        assert_eq!(child_names(&dest), vec!["Trove", "promise", "signal_lib"]);
        assert_eq!(find_node(&dest, "promise").kind, NodeKind::FolderModule);
        assert_eq!(find_node(&dest, "signal_lib").path.as_deref(), Some("Packages/signal_lib"));
        assert_eq!(find_node(&dest, "Trove").kind, NodeKind::Module);
    }
}
