//! The in-memory output tree.
//!
//! A [`TreeNode`] is one entry of the generated project tree. Nodes are keyed
//! by name inside their parent's `children` map. A `BTreeMap` keeps siblings
//! sorted, which makes serialization byte-stable between runs.
//!
//! ## Node kinds
//!
//! | Kind | `$path` | Children | Serialized as |
//! |------|---------|----------|---------------|
//! | [`NodeKind::Container`] | no | yes | `{ "$className": "Folder", ...children }` |
//! | [`NodeKind::Module`] | file | no | `{ "$path": "src/.../Foo.luau" }` |
//! | [`NodeKind::FolderModule`] | directory | discovered downstream, may carry explicit ones | `{ "$path": "src/.../Foo" }` |
//! | [`NodeKind::Asset`] | file | no | `{ "$path": "src/.../Sword.rbxm" }` |
//!
//! Any node may carry an explicit `$className` (bootstrap scripts, the
//! `DataModel` root). Without one, the downstream tool infers the class from
//! the path.

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;

/// Class name given to containers created while mirroring directories.
pub const FOLDER_CLASS: &str = "Folder";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Container,
    Module,
    FolderModule,
    Asset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub kind: NodeKind,
    /// Explicit output class, serialized as `$className`.
    pub class_name: Option<String>,
    /// Source path relative to the manifest's directory, `/`-separated.
    pub path: Option<String>,
    pub children: BTreeMap<String, TreeNode>,
}

impl TreeNode {
    /// A container with an optional explicit class (service nodes have none).
    pub fn container(class_name: Option<&str>) -> Self {
        Self {
            kind: NodeKind::Container,
            class_name: class_name.map(str::to_string),
            path: None,
            children: BTreeMap::new(),
        }
    }

    pub fn folder() -> Self {
        Self::container(Some(FOLDER_CLASS))
    }

    fn backed(kind: NodeKind, path: String) -> Self {
        Self {
            kind,
            class_name: None,
            path: Some(path),
            children: BTreeMap::new(),
        }
    }

    pub fn module(path: impl Into<String>) -> Self {
        Self::backed(NodeKind::Module, path.into())
    }

    pub fn folder_module(path: impl Into<String>) -> Self {
        Self::backed(NodeKind::FolderModule, path.into())
    }

    pub fn asset(path: impl Into<String>) -> Self {
        Self::backed(NodeKind::Asset, path.into())
    }

    pub fn with_class_name(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    /// Containers and folder-backed modules can hold explicit children.
    pub fn accepts_children(&self) -> bool {
        matches!(self.kind, NodeKind::Container | NodeKind::FolderModule)
    }

    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.contains_key(name)
    }

    /// Look up a descendant by path segments.
    pub fn get(&self, path: &[&str]) -> Option<&TreeNode> {
        path.iter()
            .try_fold(self, |node, name| node.children.get(*name))
    }

    /// Insert or replace a child, returning the replaced node.
    pub fn insert(&mut self, name: impl Into<String>, node: TreeNode) -> Option<TreeNode> {
        self.children.insert(name.into(), node)
    }

    /// Find a child that accepts children, or create a `Folder` under `name`.
    ///
    /// An existing leaf under `name` is replaced in full; callers that must
    /// not clobber check [`TreeNode::child`] first.
    pub fn ensure_folder(&mut self, name: &str) -> &mut TreeNode {
        let slot = self
            .children
            .entry(name.to_string())
            .or_insert_with(TreeNode::folder);
        if !slot.accepts_children() {
            *slot = TreeNode::folder();
        }
        slot
    }

    /// Walk `path`, creating folders as needed.
    pub fn ensure_path(&mut self, path: &[&str]) -> &mut TreeNode {
        let mut node = self;
        for name in path {
            node = node.ensure_folder(name);
        }
        node
    }

    /// Number of path-backed nodes in this subtree, including this one.
    pub fn mounted_count(&self) -> usize {
        let own = usize::from(self.path.is_some());
        own + self.children.values().map(TreeNode::mounted_count).sum::<usize>()
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.children.len()
            + usize::from(self.class_name.is_some())
            + usize::from(self.path.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(class_name) = &self.class_name {
            map.serialize_entry("$className", class_name)?;
        }
        if let Some(path) = &self.path {
            map.serialize_entry("$path", path)?;
        }
        for (name, child) in &self.children {
            map.serialize_entry(name, child)?;
        }
        map.end()
    }
}
