//! # Woolly
//!
//! Project tooling for Rojo-based Roblox games. Woolly turns a layered source
//! tree into the `*.project.json` manifest Rojo syncs from, scaffolds new
//! modules from templates, and drives `rojo`, `wally` and `rokit`.
//!
//! # Architecture: Layered Sources, One Tree
//!
//! A game is authored in three layers that all land in one output tree:
//!
//! ```text
//! src/                          base tree, shared by every place
//! src/_systems/<System>/        self-contained feature bundles
//! place_overrides/<Place>/      per-place additions and replacements
//! ```
//!
//! Generation walks them in that order:
//!
//! ```text
//! 1. Zones     src + overrides  →  Shared / Server / Client   (overrides replace)
//! 2. Systems   _systems/*       →  merged into the zones      (collisions fatal)
//! 3. Skeleton  zones + Packages →  DataModel tree → JSON
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`classify`] | Path predicates: module file, asset file, folder-backed module |
//! | [`naming`] | Name normalization (`my_thing` → `MyThing`) and place name rules |
//! | [`tree`] | The in-memory output tree and its `$className`/`$path` serialization |
//! | [`merge`] | The one recursive mirror/merge routine and its collision policies |
//! | [`manifest`] | Section tables, systems, skeleton; assembling and writing manifests |
//! | [`config`] | `woolly.toml` loading, validation, `switch` persistence, repository layout |
//! | [`scaffold`] | Template files and system/place skeletons, never overwriting |
//! | [`tools`] | Running `rojo`/`wally`/`rokit` and opening an editor |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Merge Function, Two Policies
//!
//! Overlays and systems differ only in what a name clash means. Overlays are
//! deliberate replacements, so the later write wins in full. Systems are
//! authored independently, so a clash is a bug the author must fix. Both go
//! through [`merge::Mounter::merge_dir`] with a [`merge::MergePolicy`].
//!
//! ## Deterministic Output
//!
//! Directory listings are sorted and tree children live in a `BTreeMap`, so the
//! same sources produce a byte-identical manifest on every platform. Generated
//! manifests can be committed and diffed.
//!
//! ## Build Fully, Then Write
//!
//! The whole tree is built in memory before anything touches disk. A collision
//! discovered in the last system bundle leaves the previous manifest in place.

pub mod classify;
pub mod config;
pub mod manifest;
pub mod merge;
pub mod naming;
pub mod output;
pub mod scaffold;
pub mod tools;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;
