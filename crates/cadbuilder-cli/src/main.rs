//! cadbuilder CLI - component catalog and assembly builder
//!
//! Imports GLB/GLTF components, arranges them into project assemblies and
//! ranks placement suggestions, all against a single JSON workspace file.

use anyhow::{bail, Context, Result};
use cadbuilder_assembly::{NewProject, Store};
use cadbuilder_ir::{CategoryId, CategoryLabel, ComponentId, ItemId, ProjectId};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

mod commands;
mod config;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "cadbuilder")]
#[command(about = "Component catalog and assembly builder", long_about = None)]
struct Cli {
    /// Workspace file (overrides the config file)
    #[arg(long, global = true)]
    workspace: Option<PathBuf>,
    /// Config file (default: ./cadbuilder.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty workspace file
    Init,
    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryCommand,
    },
    /// Register a GLB/GLTF file as a component and extract its geometry
    Import {
        /// Input .glb or .gltf file
        file: PathBuf,
        /// Component name (default: derived from filename)
        #[arg(short, long)]
        name: Option<String>,
        /// Category label: Motor, Roller, Belt, Frame or Base
        #[arg(short, long, default_value = "Base")]
        label: CategoryLabel,
        /// Category id
        #[arg(short, long)]
        category: Option<CategoryId>,
    },
    /// Manage components
    Component {
        #[command(subcommand)]
        action: ComponentCommand,
    },
    /// Manage projects
    Project {
        #[command(subcommand)]
        action: ProjectCommand,
    },
    /// Place a component in a project
    Place {
        project: ProjectId,
        component: ComponentId,
        /// Local position as x,y,z
        #[arg(short, long, value_parser = parse_vec3)]
        position: Option<[f64; 3]>,
        /// Parent item
        #[arg(long)]
        parent: Option<ItemId>,
        /// Display name for the item
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Move a placed item
    Move {
        project: ProjectId,
        item: ItemId,
        /// Local position as x,y,z
        #[arg(short, long, value_parser = parse_vec3)]
        position: [f64; 3],
        /// Local rotation quaternion as x,y,z,w
        #[arg(short, long, value_parser = parse_quat)]
        rotation: Option<[f64; 4]>,
    },
    /// Remove a placed item and its descendants
    Remove { project: ProjectId, item: ItemId },
    /// Rank placements of a component in a project
    Suggest {
        project: ProjectId,
        component: ComponentId,
        /// Suggestions to print (default from config)
        #[arg(short, long)]
        limit: Option<usize>,
        /// Place the component using the suggestion at this rank
        #[arg(short, long)]
        apply: Option<usize>,
    },
    /// Display workspace statistics
    Info,
}

#[derive(Subcommand)]
enum CategoryCommand {
    /// Add a category
    Add {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, default_value = "")]
        icon: String,
    },
    /// List categories
    List,
}

#[derive(Subcommand)]
enum ComponentCommand {
    /// List components
    List,
    /// Print a component as JSON
    Show { id: ComponentId },
    /// Retry geometry extraction
    Process { id: ComponentId },
    /// Remove a component and every item placing it
    Remove { id: ComponentId },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Create a project
    Create {
        name: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long)]
        owner: Option<String>,
        #[arg(long)]
        public: bool,
    },
    /// List projects
    List {
        /// Only projects owned by this user
        #[arg(short, long)]
        owner: Option<String>,
        /// Also list public projects of other users
        #[arg(long)]
        include_public: bool,
    },
    /// Show a project's item tree
    Show { id: ProjectId },
    /// Sync items with a JSON array of item updates
    Save { id: ProjectId, payload: PathBuf },
    /// Remove a project
    Remove { id: ProjectId },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = CliConfig::load(cli.config.as_deref())?;

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        config.level()?
    };
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let workspace = cli.workspace.clone().unwrap_or_else(|| config.workspace.clone());
    debug!(workspace = %workspace.display(), "using workspace");

    run(cli.command, &workspace, &config)
}

fn init_workspace(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists", path.display());
    }
    Store::new().save(path)?;
    println!("Created workspace {}", path.display());
    Ok(())
}

fn run(command: Commands, path: &Path, config: &CliConfig) -> Result<()> {
    if let Commands::Init = command {
        return init_workspace(path);
    }
    let mut store = Store::open(path)
        .with_context(|| format!("opening workspace {} (run `cadbuilder init`?)", path.display()))?;

    let changed = match command {
        Commands::Init => bail!("{} already exists", path.display()),
        Commands::Category { action } => match action {
            CategoryCommand::Add {
                name,
                description,
                icon,
            } => {
                let id = store.add_category(name.clone(), description, icon)?;
                println!("Created category {id}: {name}");
                true
            }
            CategoryCommand::List => {
                for c in store.categories() {
                    println!("{:>4}  {}  {}", c.id, c.name, c.description);
                }
                false
            }
        },
        Commands::Import {
            file,
            name,
            label,
            category,
        } => {
            let id = commands::import(&mut store, &file, name, label, category)?;
            let outcome = commands::process(&mut store, id);
            store.save(path)?;
            print!("{}", outcome?);
            return Ok(());
        }
        Commands::Component { action } => match action {
            ComponentCommand::List => {
                print!("{}", commands::list_components(&store));
                false
            }
            ComponentCommand::Show { id } => {
                println!("{}", commands::show_component(&store, id)?);
                false
            }
            ComponentCommand::Process { id } => {
                let outcome = commands::process(&mut store, id);
                store.save(path)?;
                print!("{}", outcome?);
                return Ok(());
            }
            ComponentCommand::Remove { id } => {
                print!("{}", commands::remove_component(&mut store, id)?);
                true
            }
        },
        Commands::Project { action } => match action {
            ProjectCommand::Create {
                name,
                description,
                owner,
                public,
            } => {
                let new = NewProject {
                    name,
                    description,
                    owner,
                    is_public: public,
                };
                print!("{}", commands::create_project(&mut store, new));
                true
            }
            ProjectCommand::List {
                owner,
                include_public,
            } => {
                print!(
                    "{}",
                    commands::list_projects(&store, owner.as_deref(), include_public)
                );
                false
            }
            ProjectCommand::Show { id } => {
                print!("{}", commands::show_project(&store, id)?);
                false
            }
            ProjectCommand::Save { id, payload } => {
                let report = commands::save_scene(&mut store, id, &payload)?;
                println!("{}", serde_json::to_string_pretty(&report)?);
                true
            }
            ProjectCommand::Remove { id } => {
                print!("{}", commands::remove_project(&mut store, id)?);
                true
            }
        },
        Commands::Place {
            project,
            component,
            position,
            parent,
            name,
        } => {
            let position = position.unwrap_or([0.0; 3]);
            let id = commands::place(&mut store, project, component, position, parent, name)?;
            println!("Placed item {id}");
            true
        }
        Commands::Move {
            project,
            item,
            position,
            rotation,
        } => {
            commands::move_item(&mut store, project, item, position, rotation)?;
            println!("Moved item {item}");
            true
        }
        Commands::Remove { project, item } => {
            print!("{}", commands::remove_item(&mut store, project, item)?);
            true
        }
        Commands::Suggest {
            project,
            component,
            limit,
            apply,
        } => match apply {
            Some(index) => {
                let id = commands::apply_suggestion(&mut store, project, component, index)?;
                println!("Placed item {id}");
                true
            }
            None => {
                let limit = limit.unwrap_or(config.suggestion_limit);
                let response = commands::suggest(&store, project, component, limit)?;
                println!("{}", serde_json::to_string_pretty(&response)?);
                false
            }
        },
        Commands::Info => {
            print!("{}", commands::info(&store, path));
            false
        }
    };

    if changed {
        store.save(path)?;
    }
    Ok(())
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>().map_err(|e| format!("'{v}': {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected {N} comma-separated numbers, got {}", v.len()))
}

fn parse_vec3(s: &str) -> Result<[f64; 3], String> {
    parse_floats::<3>(s)
}

fn parse_quat(s: &str) -> Result<[f64; 4], String> {
    parse_floats::<4>(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vectors() {
        assert_eq!(parse_vec3("1, 2.5,-3").unwrap(), [1.0, 2.5, -3.0]);
        assert_eq!(parse_quat("0,0,0,1").unwrap(), [0.0, 0.0, 0.0, 1.0]);
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,x,3").is_err());
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_suggest_with_global_flags() {
        let cli = Cli::try_parse_from([
            "cadbuilder",
            "suggest",
            "3",
            "7",
            "--limit",
            "5",
            "--workspace",
            "shop.json",
        ])
        .unwrap();
        assert_eq!(cli.workspace, Some(PathBuf::from("shop.json")));
        match cli.command {
            Commands::Suggest {
                project,
                component,
                limit,
                apply,
            } => {
                assert_eq!((project, component, limit, apply), (3, 7, Some(5), None));
            }
            _ => panic!("expected suggest"),
        }
    }

    #[test]
    fn label_parses_case_insensitively() {
        let cli = Cli::try_parse_from(["cadbuilder", "import", "m.glb", "--label", "motor"]).unwrap();
        match cli.command {
            Commands::Import { label, .. } => assert_eq!(label, CategoryLabel::Motor),
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn workspace_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws.json");
        let config = CliConfig::default();

        init_workspace(&path).unwrap();
        assert!(init_workspace(&path).is_err());

        run(
            Commands::Project {
                action: ProjectCommand::Create {
                    name: "line".into(),
                    description: String::new(),
                    owner: Some("ana".into()),
                    public: false,
                },
            },
            &path,
            &config,
        )
        .unwrap();

        let store = Store::open(&path).unwrap();
        assert_eq!(store.projects_for(Some("ana"), false).len(), 1);
    }
}
