//! Scaffolding: new source files from templates, and directory skeletons for
//! systems and places.
//!
//! Nothing here ever overwrites. A file that already exists is reported as
//! [`Written::Exists`] and left alone; directories are created only if absent.
//!
//! ## Where files go
//!
//! 1. `--at <dir>` always wins (relative to the repository root). With
//!    `--both`, the two variants go to `<dir>/shared` and `<dir>/server`.
//! 2. Otherwise the *root* is `place_overrides/<Place>` when `--place` names a
//!    place whose override tree exists, and `src` otherwise. Data types always
//!    use `src`, since game data is not overridable per place.
//! 3. `--system <S>` redirects to `<root>/_systems/<S>/...`.
//!
//! | Kind | Directory under the root | With `--system S` |
//! |------|--------------------------|-------------------|
//! | service | `server/services` | `_systems/S/server/services` |
//! | controller | `client/controllers` | `_systems/S/client/controllers` |
//! | component | `client/components` | `_systems/S/client/components` |
//! | data-type | `_game_data/source/data_types` | `_systems/S/data_types` |
//! | class | `shared/classes`, `server/classes` | `_systems/S/<side>/classes` |
//! | package | `shared/packages`, `server/packages` | `_systems/S/<side>/packages` |
//! | config | `shared/config` | `_systems/S/shared/config` |
//! | util | `shared/utils` | `_systems/S/shared/utils` |
//! | system | `_systems/<Name>/` skeleton | n/a |
//! | place | `place_overrides/<Name>/` skeleton | n/a |

use crate::config::Layout;
use crate::manifest::SYSTEMS_DIR;
use crate::naming;
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid name {0:?}")]
    InvalidName(String),
    #[error("{0} needs --target shared|server or --both")]
    MissingTarget(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Kind {
    Service,
    Controller,
    Component,
    System,
    #[value(alias = "data_type")]
    DataType,
    Class,
    Package,
    Config,
    Util,
    Place,
}

impl Kind {
    pub fn label(self) -> &'static str {
        match self {
            Kind::Service => "service",
            Kind::Controller => "controller",
            Kind::Component => "component",
            Kind::System => "system",
            Kind::DataType => "data type",
            Kind::Class => "class",
            Kind::Package => "package",
            Kind::Config => "config",
            Kind::Util => "util",
            Kind::Place => "place",
        }
    }
}

/// Which side a class or package is created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Side {
    Shared,
    Server,
}

impl Side {
    fn dir(self) -> &'static str {
        match self {
            Side::Shared => "shared",
            Side::Server => "server",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub kind: Kind,
    pub name: String,
    pub at: Option<PathBuf>,
    pub place: Option<String>,
    pub system: Option<String>,
    pub target: Option<Side>,
    pub both: bool,
}

impl CreateRequest {
    pub fn new(kind: Kind, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            at: None,
            place: None,
            system: None,
            target: None,
            both: false,
        }
    }

    fn sides(&self) -> Result<Vec<Side>, ScaffoldError> {
        match (self.both, self.target) {
            (true, _) => Ok(vec![Side::Shared, Side::Server]),
            (false, Some(side)) => Ok(vec![side]),
            (false, None) => Err(ScaffoldError::MissingTarget(self.kind.label())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Written {
    Created(PathBuf),
    Exists(PathBuf),
}

impl Written {
    pub fn path(&self) -> &Path {
        match self {
            Written::Created(path) | Written::Exists(path) => path,
        }
    }
}

/// Everything a scaffold call touched.
#[derive(Debug, Default)]
pub struct Scaffold {
    pub files: Vec<Written>,
    /// Directories that did not exist before.
    pub dirs: Vec<PathBuf>,
}

impl Scaffold {
    /// The first newly created file, which is the one opened in the editor.
    pub fn first_created(&self) -> Option<&Path> {
        self.files.iter().find_map(|w| match w {
            Written::Created(path) => Some(path.as_path()),
            Written::Exists(_) => None,
        })
    }

    fn ensure_dir(&mut self, dir: &Path) -> Result<(), ScaffoldError> {
        if !dir.is_dir() {
            fs::create_dir_all(dir)?;
            self.dirs.push(dir.to_path_buf());
        }
        Ok(())
    }

    fn write_if_missing(&mut self, path: &Path, content: &str) -> Result<(), ScaffoldError> {
        if path.exists() {
            debug!(path = %path.display(), "exists, not overwriting");
            self.files.push(Written::Exists(path.to_path_buf()));
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            self.ensure_dir(parent)?;
        }
        fs::write(path, content)?;
        debug!(path = %path.display(), "wrote");
        self.files.push(Written::Created(path.to_path_buf()));
        Ok(())
    }
}

// ============================================================================
// Templates
// ============================================================================

mod templates {
    pub const SERVICE: &str = include_str!("../templates/service.luau");
    pub const CONTROLLER: &str = include_str!("../templates/controller.luau");
    pub const COMPONENT: &str = include_str!("../templates/component.luau");
    pub const DATA_TYPE: &str = include_str!("../templates/data_type.luau");
    pub const SHARED_CLASS: &str = include_str!("../templates/shared_class.luau");
    pub const SERVER_CLASS: &str = include_str!("../templates/server_class.luau");
    pub const PACKAGE: &str = include_str!("../templates/package.luau");
    pub const CONFIG: &str = include_str!("../templates/config.luau");
    pub const UTIL: &str = include_str!("../templates/util.luau");
    pub const DEV_PRODUCTS: &str = include_str!("../templates/dev_products.luau");
    pub const GAMEPASSES: &str = include_str!("../templates/gamepasses.luau");
}

fn render(template: &str, name: &str) -> String {
    template.replace("{{Name}}", name)
}

// ============================================================================
// Skeletons
// ============================================================================

const PLACE_DIRS: &[&str] = &[
    "shared/assets/ui",
    "shared/assets/models",
    "shared/classes",
    "shared/config",
    "shared/packages",
    "shared/utils",
    "client/controllers",
    "client/components",
    "client/utils",
    "server/services",
    "server/packages",
    "server/classes",
];

const SYSTEM_DIRS: &[&str] = &[
    "server/services",
    "server/packages",
    "server/classes",
    "client/controllers",
    "client/components",
    "client/utils",
    "shared/assets/ui",
    "shared/assets/models",
    "shared/classes",
    "shared/utils",
    "shared/packages",
    "shared/config",
    "data_types",
    "monetisation",
];

/// Create the override tree for `place`, keeping existing content.
pub fn ensure_place_skeleton(layout: &Layout, place: &str) -> Result<Scaffold, ScaffoldError> {
    if !naming::is_valid_place_name(place) {
        return Err(ScaffoldError::InvalidName(place.to_string()));
    }
    let base = layout.place_overrides(place);
    let mut out = Scaffold::default();
    for rel in PLACE_DIRS {
        out.ensure_dir(&base.join(rel))?;
    }
    Ok(out)
}

fn create_system(parent: &Path, name: &str) -> Result<Scaffold, ScaffoldError> {
    // System directory names are kept as typed; they never become node names.
    if !naming::is_valid_place_name(name) {
        return Err(ScaffoldError::InvalidName(name.to_string()));
    }
    let base = parent.join(name);
    let mut out = Scaffold::default();
    for rel in SYSTEM_DIRS {
        out.ensure_dir(&base.join(rel))?;
    }
    let monetisation = base.join("monetisation");
    out.write_if_missing(
        &monetisation.join("DevProducts.luau"),
        &render(templates::DEV_PRODUCTS, name),
    )?;
    out.write_if_missing(
        &monetisation.join("Gamepasses.luau"),
        &render(templates::GAMEPASSES, name),
    )?;
    Ok(out)
}

// ============================================================================
// Create
// ============================================================================

/// Directory resolution for one request.
struct Destination<'a> {
    layout: &'a Layout,
    req: &'a CreateRequest,
}

impl Destination<'_> {
    fn root(&self, prefer_src: bool) -> PathBuf {
        if prefer_src {
            self.layout.src.clone()
        } else {
            self.layout.source_root_for(self.req.place.as_deref())
        }
    }

    /// `plain` under the root, or `in_system` under the named bundle.
    fn dir(&self, plain: &str, in_system: &str, prefer_src: bool) -> PathBuf {
        if let Some(at) = &self.req.at {
            return self.layout.root.join(at);
        }
        let root = self.root(prefer_src);
        match &self.req.system {
            Some(system) => root.join(SYSTEMS_DIR).join(system).join(in_system),
            None => root.join(plain),
        }
    }

    fn same(&self, rel: &str) -> PathBuf {
        self.dir(rel, rel, false)
    }

    /// `<side>/<section>`. With `--at` and `--both` each side gets its own
    /// subdirectory of the `--at` directory.
    fn sided(&self, side: Side, section: &str) -> PathBuf {
        let dir = self.same(&format!("{}/{section}", side.dir()));
        if self.req.at.is_some() && self.req.both {
            dir.join(side.dir())
        } else {
            dir
        }
    }
}

/// Scaffold whatever `req` asks for.
pub fn create(layout: &Layout, req: &CreateRequest) -> Result<Scaffold, ScaffoldError> {
    for dir_name in [&req.place, &req.system].into_iter().flatten() {
        if !naming::is_valid_place_name(dir_name) {
            return Err(ScaffoldError::InvalidName(dir_name.clone()));
        }
    }

    match req.kind {
        Kind::Place => return ensure_place_skeleton(layout, &req.name),
        Kind::System => {
            let parent = match &req.at {
                Some(at) => layout.root.join(at),
                None => layout.source_root_for(req.place.as_deref()).join(SYSTEMS_DIR),
            };
            return create_system(&parent, &req.name);
        }
        _ => {}
    }

    let name = naming::normalize(&req.name);
    if name.is_empty() {
        return Err(ScaffoldError::InvalidName(req.name.clone()));
    }
    let file = format!("{name}.luau");
    let dest = Destination { layout, req };
    let mut out = Scaffold::default();

    let single = |dir: PathBuf, template: &str, out: &mut Scaffold| {
        out.write_if_missing(&dir.join(&file), &render(template, &name))
    };

    match req.kind {
        Kind::Service => single(dest.same("server/services"), templates::SERVICE, &mut out)?,
        Kind::Controller => single(dest.same("client/controllers"), templates::CONTROLLER, &mut out)?,
        Kind::Component => single(dest.same("client/components"), templates::COMPONENT, &mut out)?,
        Kind::DataType => single(
            dest.dir("_game_data/source/data_types", "data_types", true),
            templates::DATA_TYPE,
            &mut out,
        )?,
        Kind::Config => single(dest.same("shared/config"), templates::CONFIG, &mut out)?,
        Kind::Util => single(dest.same("shared/utils"), templates::UTIL, &mut out)?,
        Kind::Class => {
            for side in req.sides()? {
                let template = match side {
                    Side::Shared => templates::SHARED_CLASS,
                    Side::Server => templates::SERVER_CLASS,
                };
                single(dest.sided(side, "classes"), template, &mut out)?;
            }
        }
        Kind::Package => {
            for side in req.sides()? {
                single(dest.sided(side, "packages"), templates::PACKAGE, &mut out)?;
            }
        }
        Kind::Place | Kind::System => {}
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    fn created(out: &Scaffold) -> Vec<PathBuf> {
        out.files
            .iter()
            .filter_map(|w| match w {
                Written::Created(p) => Some(p.clone()),
                Written::Exists(_) => None,
            })
            .collect()
    }

    #[test]
    fn service_goes_to_src_with_normalized_name() {
        let (_tmp, layout) = project(&[]);
        let out = create(&layout, &CreateRequest::new(Kind::Service, "loot_drop")).unwrap();

        let path = layout.src.join("server/services/LootDrop.luau");
        assert_eq!(created(&out), vec![path.clone()]);
        let body = fs::read_to_string(path).unwrap();
        assert!(body.contains("LootDrop (Service)"));
        assert!(!body.contains("{{Name}}"));
    }

    #[test]
    fn existing_file_is_never_overwritten() {
        let (tmp, layout) = project(&[]);
        write_into(tmp.path(), &["src/client/controllers/Camera.luau"]);
        let path = layout.src.join("client/controllers/Camera.luau");
        let before = fs::read_to_string(&path).unwrap();

        let out = create(&layout, &CreateRequest::new(Kind::Controller, "camera")).unwrap();
        assert_eq!(out.files, vec![Written::Exists(path.clone())]);
        assert!(out.first_created().is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn place_overrides_used_only_when_present() {
        let (_tmp, layout) = project(&["place_overrides/Lobby/"]);

        let mut req = CreateRequest::new(Kind::Util, "math");
        req.place = Some("Lobby".into());
        let out = create(&layout, &req).unwrap();
        assert_eq!(
            out.first_created(),
            Some(layout.place_overrides("Lobby").join("shared/utils/Math.luau").as_path())
        );

        req.place = Some("Arena".into());
        let out = create(&layout, &req).unwrap();
        assert_eq!(
            out.first_created(),
            Some(layout.src.join("shared/utils/Math.luau").as_path())
        );
    }

    #[test]
    fn at_always_wins() {
        let (_tmp, layout) = project(&["place_overrides/Lobby/"]);
        let mut req = CreateRequest::new(Kind::Component, "health_bar");
        req.at = Some(PathBuf::from("scratch/ui"));
        req.place = Some("Lobby".into());
        req.system = Some("hud".into());

        let out = create(&layout, &req).unwrap();
        assert_eq!(
            out.first_created(),
            Some(layout.root.join("scratch/ui/HealthBar.luau").as_path())
        );
    }

    #[test]
    fn system_flag_redirects_into_bundle() {
        let (_tmp, layout) = project(&[]);
        let mut req = CreateRequest::new(Kind::Config, "shop");
        req.system = Some("economy".into());

        let out = create(&layout, &req).unwrap();
        assert_eq!(
            out.first_created(),
            Some(layout.src.join("_systems/economy/shared/config/Shop.luau").as_path())
        );
    }

    #[test]
    fn data_types_ignore_place_overrides() {
        let (_tmp, layout) = project(&["place_overrides/Lobby/"]);
        let mut req = CreateRequest::new(Kind::DataType, "weapons");
        req.place = Some("Lobby".into());
        let out = create(&layout, &req).unwrap();
        assert_eq!(
            out.first_created(),
            Some(layout.src.join("_game_data/source/data_types/Weapons.luau").as_path())
        );

        req.system = Some("combat".into());
        let out = create(&layout, &req).unwrap();
        assert_eq!(
            out.first_created(),
            Some(layout.src.join("_systems/combat/data_types/Weapons.luau").as_path())
        );
    }

    #[test]
    fn class_requires_target() {
        let (_tmp, layout) = project(&[]);
        let err = create(&layout, &CreateRequest::new(Kind::Class, "Inventory")).unwrap_err();
        assert!(matches!(err, ScaffoldError::MissingTarget("class")));

        let err = create(&layout, &CreateRequest::new(Kind::Package, "Net")).unwrap_err();
        assert!(matches!(err, ScaffoldError::MissingTarget("package")));
    }

    #[test]
    fn class_both_sides_use_side_templates() {
        let (_tmp, layout) = project(&[]);
        let mut req = CreateRequest::new(Kind::Class, "inventory");
        req.both = true;
        let out = create(&layout, &req).unwrap();

        let shared = layout.src.join("shared/classes/Inventory.luau");
        let server = layout.src.join("server/classes/Inventory.luau");
        assert_eq!(created(&out), vec![shared.clone(), server.clone()]);
        assert!(fs::read_to_string(shared).unwrap().contains("(Shared Class)"));
        assert!(fs::read_to_string(server).unwrap().contains("(Server Class)"));
    }

    #[test]
    fn both_sides_under_at_get_separate_dirs() {
        let (_tmp, layout) = project(&[]);
        let mut req = CreateRequest::new(Kind::Class, "inventory");
        req.both = true;
        req.at = Some(PathBuf::from("lib"));
        let out = create(&layout, &req).unwrap();

        assert_eq!(
            created(&out),
            vec![
                layout.root.join("lib/shared/Inventory.luau"),
                layout.root.join("lib/server/Inventory.luau"),
            ]
        );

        req.both = false;
        req.target = Some(Side::Server);
        req.name = "cart".into();
        let out = create(&layout, &req).unwrap();
        assert_eq!(created(&out), vec![layout.root.join("lib/Cart.luau")]);
    }

    #[test]
    fn package_single_side() {
        let (_tmp, layout) = project(&[]);
        let mut req = CreateRequest::new(Kind::Package, "net");
        req.target = Some(Side::Server);
        let out = create(&layout, &req).unwrap();
        assert_eq!(created(&out), vec![layout.src.join("server/packages/Net.luau")]);
    }

    #[test]
    fn system_skeleton() {
        let (_tmp, layout) = project(&[]);
        let out = create(&layout, &CreateRequest::new(Kind::System, "combat")).unwrap();

        let base = layout.src.join("_systems/combat");
        assert!(base.join("server/services").is_dir());
        assert!(base.join("shared/assets/models").is_dir());
        assert!(base.join("data_types").is_dir());
        assert_eq!(
            created(&out),
            vec![
                base.join("monetisation/DevProducts.luau"),
                base.join("monetisation/Gamepasses.luau"),
            ]
        );
        assert!(out.first_created().is_some());

        let again = create(&layout, &CreateRequest::new(Kind::System, "combat")).unwrap();
        assert!(again.dirs.is_empty());
        assert!(again.first_created().is_none());
    }

    #[test]
    fn place_skeleton_keeps_content() {
        let (tmp, layout) = project(&[]);
        let out = create(&layout, &CreateRequest::new(Kind::Place, "Arena")).unwrap();
        assert_eq!(out.dirs.len(), PLACE_DIRS.len());
        assert!(layout.place_overrides("Arena").join("client/utils").is_dir());

        write_into(tmp.path(), &["place_overrides/Arena/shared/config/Keep.luau"]);
        let again = ensure_place_skeleton(&layout, "Arena").unwrap();
        assert!(again.dirs.is_empty());
        assert!(layout.place_overrides("Arena").join("shared/config/Keep.luau").is_file());
    }

    #[test]
    fn invalid_names_rejected() {
        let (_tmp, layout) = project(&[]);
        assert!(matches!(
            create(&layout, &CreateRequest::new(Kind::Service, "--")),
            Err(ScaffoldError::InvalidName(_))
        ));
        assert!(matches!(
            create(&layout, &CreateRequest::new(Kind::Place, "../up")),
            Err(ScaffoldError::InvalidName(_))
        ));
        let mut req = CreateRequest::new(Kind::Util, "x");
        req.system = Some("a/b".into());
        assert!(matches!(create(&layout, &req), Err(ScaffoldError::InvalidName(_))));
        req.system = None;
        req.place = Some("..".into());
        assert!(matches!(create(&layout, &req), Err(ScaffoldError::InvalidName(_))));
    }

    #[test]
    fn data_type_alias_parses() {
        assert_eq!(Kind::from_str("data_type", false), Ok(Kind::DataType));
        assert_eq!(Kind::from_str("data-type", false), Ok(Kind::DataType));
    }
}
