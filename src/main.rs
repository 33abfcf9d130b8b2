use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use woolly::config::{self, Layout};
use woolly::manifest::{self, Target};
use woolly::output;
use woolly::scaffold::{self, CreateRequest, Kind, Side};
use woolly::tools::{self, ToolError};

fn version_string() -> &'static str {
    let on_tag = env!("WOOLLY_ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("WOOLLY_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "woolly")]
#[command(about = "Rojo project generator and scaffolding for Roblox games")]
#[command(long_about = "\
Rojo project generator and scaffolding for Roblox games

Sources are layered: the base tree, system bundles, and per-place overrides.
`woolly gen` merges them into one <Place>.project.json for Rojo.

Repository structure:

  woolly.toml                      # Optional config (see `woolly gen-config`)
  src/
  ├── shared/{config,classes,utils,packages,assets/{ui,models}}
  ├── server/{services,packages,classes}, Bootstrap.server.luau
  ├── client/{controllers,components,utils}, Bootstrap.client.luau
  ├── _game_data/{resolver,source}  # GameData / GameDataMaster
  ├── _monetisation/{resolver,source}
  ├── _types/
  └── _systems/<System>/           # Bundles: same layout, merged in, collisions fatal
  place_overrides/<Place>/         # Replaces or adds to src for one place
  Packages/                        # wally packages → ReplicatedStorage.ExternalPackages
  places/<Place>.project.json      # Generated

Set RUST_LOG or pass -v for diagnostics.")]
#[command(version = version_string())]
struct Cli {
    /// Repository root
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// More diagnostics on stderr (-v debug for woolly, -vv everything)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct CreateArgs {
    /// What to create
    #[arg(value_enum)]
    kind: Kind,
    /// Name; file names are normalized (loot_drop → LootDrop.luau)
    name: String,
    /// Directory to create in, relative to the root. Always wins.
    #[arg(long)]
    at: Option<PathBuf>,
    /// Place whose override tree to write into, if it exists
    #[arg(long)]
    place: Option<String>,
    /// System bundle to write into (src/_systems/<SYSTEM>/...)
    #[arg(long)]
    system: Option<String>,
    /// Side for class and package
    #[arg(long, value_enum)]
    target: Option<Side>,
    /// Create both the shared and server variants (under --at: <DIR>/shared, <DIR>/server)
    #[arg(long, conflicts_with = "target")]
    both: bool,
    /// Don't open the new file in an editor
    #[arg(long)]
    no_open: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the project manifest for a place
    Gen {
        /// Place name (default: default_place from woolly.toml)
        place: Option<String>,
        /// Generate default.project.json from src only, without overrides
        #[arg(long, conflicts_with = "place")]
        default: bool,
    },
    /// Scaffold a module, system, or place from templates
    Create(CreateArgs),
    /// List known places
    List,
    /// Open a place's manifest in an editor, generating it if missing
    Open { place: Option<String> },
    /// Make a place the default
    Switch { place: String },
    /// Install tools and packages, generate, build, then serve
    Setup { place: Option<String> },
    /// Run `rojo serve` for a place
    Serve { place: Option<String> },
    /// Build builds/<Place>.rbxlx with `rojo build`
    Build { place: Option<String> },
    /// Print a stock woolly.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Err(err) => match err.downcast_ref::<ToolError>() {
            Some(tool_err) => {
                eprintln!("Error: {tool_err}");
                std::process::exit(tool_err.exit_code());
            }
            None => Err(err),
        },
        Ok(()) => Ok(()),
    }
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the `-v` level.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "woolly=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let layout = Layout::load(&cli.root)?;

    match cli.command {
        Command::Gen { place, default } => {
            let target = if default {
                Target::Default
            } else {
                Target::resolve(&layout, place.as_deref())?
            };
            let assembly = manifest::generate(&layout, &target)?;
            output::print_generate_output(&assembly, &layout);
        }
        Command::Create(args) => create(&layout, args)?,
        Command::List => {
            let places = manifest::known_places(&layout)?;
            output::print_places(&places, &layout.config.default_place, &layout);
        }
        Command::Open { place } => {
            let target = Target::resolve(&layout, place.as_deref())?;
            ensure_manifest(&layout, &target)?;
            tools::open_in_editor(&target.manifest_path(&layout), &layout.root);
        }
        Command::Switch { place } => {
            Target::place(&place)?;
            config::set_default_place(&layout.root, &place)?;
            output::print_switch_output(&place, &layout.root.join(config::CONFIG_FILE), &layout);
        }
        Command::Setup { place } => {
            let target = Target::resolve(&layout, place.as_deref())?;
            setup(&layout, &target)?;
        }
        Command::Serve { place } => {
            let target = Target::resolve(&layout, place.as_deref())?;
            ensure_manifest(&layout, &target)?;
            serve(&layout, &target)?;
        }
        Command::Build { place } => {
            let target = Target::resolve(&layout, place.as_deref())?;
            ensure_manifest(&layout, &target)?;
            build(&layout, &target)?;
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn create(layout: &Layout, args: CreateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let req = CreateRequest {
        kind: args.kind,
        name: args.name,
        at: args.at,
        place: args.place,
        system: args.system,
        target: args.target,
        both: args.both,
    };
    let scaffold = scaffold::create(layout, &req)?;
    output::print_scaffold_output(&scaffold, layout);

    if !args.no_open {
        if let Some(path) = scaffold.first_created() {
            tools::open_in_editor(path, &layout.root);
        }
    }

    // A new place regenerates its own manifest; everything else the place it targeted.
    let place = match req.kind {
        Kind::Place => Some(req.name.as_str()),
        _ => req.place.as_deref(),
    };
    let target = Target::resolve(layout, place)?;
    let assembly = manifest::generate(layout, &target)?;
    output::print_generate_output(&assembly, layout);
    Ok(())
}

/// Generate the manifest if it has never been written.
fn ensure_manifest(layout: &Layout, target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    let path = target.manifest_path(layout);
    if !path.is_file() {
        println!("==> No manifest at {} yet, generating", layout.display(&path));
    }
    if let Some(assembly) = manifest::ensure_manifest(layout, target)? {
        output::print_generate_output(&assembly, layout);
    }
    Ok(())
}

fn setup(layout: &Layout, target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(place) = target.place_name() {
        let skeleton = scaffold::ensure_place_skeleton(layout, place)?;
        println!("==> Place skeleton: {}", layout.display(&layout.place_overrides(place)));
        output::print_scaffold_output(&skeleton, layout);
    }

    for (program, args) in tools::INSTALL_STEPS {
        println!("==> {}", tools::describe(program, args));
        if let Err(e) = tools::run(program, args, &layout.root) {
            warn!("{e}; continuing");
        }
    }

    println!("==> Generating");
    let assembly = manifest::generate(layout, target)?;
    output::print_generate_output(&assembly, layout);

    build(layout, target)?;
    serve(layout, target)
}

fn build(layout: &Layout, target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    let place = target.place_name().unwrap_or("default");
    let out = layout.build_output(place);
    std::fs::create_dir_all(&layout.builds)?;

    let project = layout.display(&target.manifest_path(layout));
    let out_rel = layout.display(&out);
    println!("==> rojo build {project} -o {out_rel}");
    tools::rojo_build(&layout.root, &project, &out_rel)?;
    println!("==> Built {out_rel}");
    Ok(())
}

fn serve(layout: &Layout, target: &Target) -> Result<(), Box<dyn std::error::Error>> {
    let project = layout.display(&target.manifest_path(layout));
    println!("==> rojo serve {project}");
    tools::rojo_serve(&layout.root, &project)?;
    Ok(())
}
