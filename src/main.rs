//! Satisfactory Production Tracker
//!
//! Command-line front end: every invocation loads the saved session, runs one
//! command and saves back if anything changed.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use satisfactory_tracker::error::{EntityKind, TrackerError};
use satisfactory_tracker::models::{Base, Facility, Purity, ResourceNode};
use satisfactory_tracker::parse::parse_item_list;
use satisfactory_tracker::planner::{net_production, possible_recipes, recipe_requirements};
use satisfactory_tracker::report::{
    BaseSummary, BottleneckReport, FacilityDetails, NetProductionReport, ProductionReport, RequirementReport,
    format_nodes,
};
use satisfactory_tracker::{Session, db, export, import};

#[derive(Parser)]
#[command(name = "satisfactory-tracker")]
#[command(about = "Production and consumption tracker for Satisfactory factories")]
struct Cli {
    /// Path to the SQLite database
    #[arg(short, long, env = "SATISFACTORY_TRACKER_DB", default_value = "satisfactory_tracker.db")]
    database: PathBuf,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Manage resource, miner, building and recipe definitions
    #[command(subcommand)]
    Catalog(CatalogCommand),

    /// Manage bases
    #[command(subcommand)]
    Base(BaseCommand),

    /// Manage resource nodes
    #[command(subcommand)]
    Node(NodeCommand),

    /// Manage facilities inside a base
    #[command(subcommand)]
    Facility(FacilityCommand),

    /// Show global production and consumption rates
    Rates,

    /// Show net production of a base and the recipes its surplus could feed
    Net {
        base_id: u32,
    },

    /// List items consumed faster than they are produced
    Bottlenecks,

    /// Check whether a base's surplus covers a recipe's inputs
    Plan {
        base_id: u32,
        recipe: String,
    },

    /// Dump the session as JSON (to stdout when no path is given)
    Export {
        path: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum CatalogCommand {
    AddResource {
        name: String,
    },
    AddMiner {
        name: String,
        /// Extraction rate per minute on a normal node at 100%
        base_rate: f64,
    },
    AddBuilding {
        name: String,
    },
    AddRecipe {
        name: String,
        building: String,
        /// Comma separated ITEM=RATE list
        #[arg(long, default_value = "")]
        inputs: String,
        /// Comma separated ITEM=RATE list
        #[arg(long)]
        outputs: String,
    },
    DeleteResource {
        name: String,
    },
    DeleteMiner {
        name: String,
    },
    DeleteBuilding {
        name: String,
    },
    DeleteRecipe {
        name: String,
    },
    /// List all catalog entries
    List,
    /// Import *.catalog files from a directory tree
    Import {
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum BaseCommand {
    Add {
        name: String,
    },
    /// Show every base with its nodes, facilities and storage
    List,
    Delete {
        base_id: u32,
    },
    /// Add to (or, with a negative amount, take from) a base's stored items
    Storage {
        base_id: u32,
        item: String,
        #[arg(allow_hyphen_values = true)]
        delta: f64,
    },
}

#[derive(Subcommand)]
enum NodeCommand {
    Add {
        /// Resource type (e.g., "Iron Ore")
        resource: String,
        /// Impure, Normal or Pure
        purity: String,
        /// Miner type from the catalog
        miner: String,
        /// Override the catalog's miner rate
        #[arg(long)]
        rate: Option<f64>,
        /// Base to place the node in; unlinked when omitted
        #[arg(long)]
        base: Option<u32>,
        /// Initial clock speed in percent
        #[arg(long)]
        clock: Option<f64>,
    },
    /// Move an unlinked node into a base
    Link {
        node_id: u32,
        base_id: u32,
    },
    /// Set a node's clock speed in percent
    Overclock {
        node_id: u32,
        #[arg(allow_hyphen_values = true)]
        clock_speed: f64,
    },
    Delete {
        node_id: u32,
    },
    List,
}

#[derive(Subcommand)]
enum FacilityCommand {
    /// Add facilities running a catalog recipe
    Add {
        base_id: u32,
        recipe: String,
        /// Facility type; must be a building the recipe runs in
        #[arg(long)]
        building: Option<String>,
        /// Number of identical facilities to add
        #[arg(short, long, default_value_t = 1)]
        count: u32,
    },
    /// Add a facility with hand-entered items
    AddCustom {
        base_id: u32,
        facility_type: String,
        recipe: String,
        #[arg(long, default_value = "")]
        inputs: String,
        #[arg(long, default_value = "")]
        outputs: String,
    },
    /// Replace a facility's recipe (resets clock speed)
    EditRecipe {
        base_id: u32,
        facility_id: u32,
        recipe: String,
    },
    SetClock {
        base_id: u32,
        facility_id: u32,
        #[arg(allow_hyphen_values = true)]
        clock_speed: f64,
    },
    Toggle {
        base_id: u32,
        facility_id: u32,
    },
    Delete {
        base_id: u32,
        facility_id: u32,
    },
    Show {
        base_id: u32,
        facility_id: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let conn = Connection::open(&cli.database)?;
    db::init_schema(&conn)?;

    if let Commands::Init = cli.command {
        println!("Database initialized at: {}", cli.database.display());
        return Ok(());
    }

    let mut session = db::load_session(&conn)?;
    if run(cli.command, &mut session)? {
        db::save_session(&conn, &session)?;
    }

    Ok(())
}

/// Run one command. Returns whether the session changed.
fn run(command: Commands, session: &mut Session) -> Result<bool> {
    match command {
        Commands::Init => Ok(false),
        Commands::Catalog(cmd) => run_catalog(cmd, session),
        Commands::Base(cmd) => run_base(cmd, session),
        Commands::Node(cmd) => run_node(cmd, session),
        Commands::Facility(cmd) => run_facility(cmd, session),

        Commands::Rates => {
            let rates = session.graph.calculate_production_rates();
            print!("{}", ProductionReport(&rates));
            Ok(false)
        }

        Commands::Net { base_id } => {
            let base = session.graph.require_base(base_id)?;
            let rates = session.graph.calculate_production_rates_for_base(base_id);
            let net = net_production(&rates);
            let possible = possible_recipes(&session.catalog.recipes, &net);
            print!(
                "{}",
                NetProductionReport {
                    base,
                    rates: &rates,
                    net: &net,
                    possible: &possible,
                }
            );
            Ok(false)
        }

        Commands::Bottlenecks => {
            let bottlenecks = session.graph.identify_bottlenecks();
            print!("{}", BottleneckReport(&bottlenecks));
            Ok(false)
        }

        Commands::Plan { base_id, recipe } => {
            session.graph.require_base(base_id)?;
            let recipe = session.catalog.require_recipe(&recipe)?;
            let net = net_production(&session.graph.calculate_production_rates_for_base(base_id));
            let rows = recipe_requirements(recipe, &net);
            print!(
                "{}",
                RequirementReport {
                    recipe: &recipe.name,
                    rows: &rows,
                }
            );
            Ok(false)
        }

        Commands::Export { path } => {
            match path {
                Some(path) => {
                    export::export_session(session, &path)?;
                    println!("Session exported to {}", path.display());
                }
                None => println!("{}", export::session_to_json(session)?),
            }
            Ok(false)
        }
    }
}

fn run_catalog(command: CatalogCommand, session: &mut Session) -> Result<bool> {
    let catalog = &mut session.catalog;
    match command {
        CatalogCommand::AddResource { name } => {
            catalog.add_resource_type(name.as_str());
            println!("Added resource type: {}", name);
        }
        CatalogCommand::AddMiner { name, base_rate } => {
            catalog.add_miner_type(name.as_str(), base_rate);
            println!("Added miner type: {} ({}/min)", name, base_rate);
        }
        CatalogCommand::AddBuilding { name } => {
            catalog.add_building_type(name.as_str());
            println!("Added building type: {}", name);
        }
        CatalogCommand::AddRecipe {
            name,
            building,
            inputs,
            outputs,
        } => {
            let inputs = parse_item_list(&inputs)?;
            let outputs = parse_item_list(&outputs)?;
            catalog.add_recipe(name.as_str(), building, inputs, outputs);
            println!("Added recipe: {}", name);
        }
        CatalogCommand::DeleteResource { name } => catalog.delete_resource_type(&name),
        CatalogCommand::DeleteMiner { name } => catalog.delete_miner_type(&name),
        CatalogCommand::DeleteBuilding { name } => catalog.delete_building_type(&name),
        CatalogCommand::DeleteRecipe { name } => catalog.delete_recipe(&name),

        CatalogCommand::List => {
            println!("Resource types:");
            for resource in &catalog.resource_types {
                println!("  {}", resource.name);
            }
            println!("Miner types:");
            for miner in &catalog.miner_types {
                println!("  {:<20} {:>8.2}/min", miner.name, miner.base_rate);
            }
            println!("Building types:");
            for building in &catalog.building_types {
                println!("  {}", building.name);
            }
            println!("Recipes:");
            for recipe in &catalog.recipes {
                println!("  {} ({})", recipe.name, recipe.building_type);
                for input in &recipe.inputs {
                    println!("    in:  {}", input);
                }
                for output in &recipe.outputs {
                    println!("    out: {}", output);
                }
            }
            return Ok(false);
        }

        CatalogCommand::Import { dir } => {
            let stats = import::import_catalog(catalog, &dir)?;
            println!("{}", stats);
        }
    }
    Ok(true)
}

fn run_base(command: BaseCommand, session: &mut Session) -> Result<bool> {
    match command {
        BaseCommand::Add { name } => {
            let base_id = session.ids.next_base_id();
            session.graph.add_base(Base::new(base_id, name.as_str()));
            println!("Added base '{}' with ID {}", name, base_id);
        }
        BaseCommand::List => {
            if session.graph.bases.is_empty() {
                println!("No bases defined. Run 'base add' first.");
            }
            for base in session.graph.bases.values() {
                println!("{}", BaseSummary(base));
            }
            return Ok(false);
        }
        BaseCommand::Delete { base_id } => {
            session.graph.require_base(base_id)?;
            session.graph.delete_base(base_id);
            println!("Deleted base {}", base_id);
        }
        BaseCommand::Storage { base_id, item, delta } => {
            let base = session.graph.require_base_mut(base_id)?;
            base.update_storage(&item, delta);
            println!("Base {} now stores {} x {}", base_id, base.storage[&item], item);
        }
    }
    Ok(true)
}

fn run_node(command: NodeCommand, session: &mut Session) -> Result<bool> {
    match command {
        NodeCommand::Add {
            resource,
            purity,
            miner,
            rate,
            base,
            clock,
        } => {
            let purity: Purity = purity.parse()?;
            let miner_rate = match rate {
                Some(rate) => rate,
                None => session.catalog.require_miner(&miner)?.base_rate,
            };

            let node_id = session.ids.next_node_id();
            let mut node = ResourceNode::new(node_id, resource, purity, miner, miner_rate);
            if let Some(clock) = clock {
                node.set_clock_speed(clock);
            }
            let output = node.output_rate();

            match session.graph.add_node(node, base) {
                Some(base_id) => println!("Added node {} to base {} ({:.2}/min)", node_id, base_id, output),
                None => println!("Added unlinked node {} ({:.2}/min)", node_id, output),
            }
        }
        NodeCommand::Link { node_id, base_id } => {
            session.graph.link_node(node_id, base_id)?;
            println!("Linked node {} to base {}", node_id, base_id);
        }
        NodeCommand::Overclock { node_id, clock_speed } => {
            let node = session
                .graph
                .find_node_mut(node_id)
                .ok_or_else(|| TrackerError::invalid(EntityKind::Node, node_id))?;
            node.set_clock_speed(clock_speed);
            println!(
                "Node {} now runs at {}% ({:.2}/min)",
                node_id,
                node.clock_speed(),
                node.output_rate()
            );
        }
        NodeCommand::Delete { node_id } => {
            if session.graph.find_node(node_id).is_none() {
                return Err(TrackerError::invalid(EntityKind::Node, node_id).into());
            }
            session.graph.delete_node(node_id);
            println!("Deleted node {}", node_id);
        }
        NodeCommand::List => {
            let nodes = session
                .graph
                .all_nodes()
                .map(|(node, base)| (node, base.map(|b| b.name.as_str())));
            print!("{}", format_nodes(nodes));
            return Ok(false);
        }
    }
    Ok(true)
}

fn run_facility(command: FacilityCommand, session: &mut Session) -> Result<bool> {
    match command {
        FacilityCommand::Add {
            base_id,
            recipe,
            building,
            count,
        } => {
            for facility_id in session.add_facilities(base_id, &recipe, building.as_deref(), count)? {
                let facility = session.graph.require_facility_mut(base_id, facility_id)?;
                println!("Added {} {} to base {}", facility.facility_type, facility_id, base_id);
            }
        }
        FacilityCommand::AddCustom {
            base_id,
            facility_type,
            recipe,
            inputs,
            outputs,
        } => {
            let inputs = parse_item_list(&inputs)?;
            let outputs = parse_item_list(&outputs)?;
            let base = session.graph.require_base_mut(base_id)?;

            let facility_id = session.ids.next_facility_id();
            let mut facility = Facility::new(facility_id, facility_type, recipe);
            for input in inputs {
                facility.set_input_item(input.item, input.rate);
            }
            for output in outputs {
                facility.set_output_item(output.item, output.rate);
            }
            base.add_facility(facility);
            println!("Added facility {} to base {}", facility_id, base_id);
        }
        FacilityCommand::EditRecipe {
            base_id,
            facility_id,
            recipe,
        } => {
            session.edit_facility_recipe(base_id, facility_id, &recipe)?;
            println!("Facility {} now runs {}", facility_id, recipe);
        }
        FacilityCommand::SetClock {
            base_id,
            facility_id,
            clock_speed,
        } => {
            let facility = session.graph.require_facility_mut(base_id, facility_id)?;
            facility.set_clock_speed(clock_speed);
            println!("Facility {} now runs at {}%", facility_id, facility.clock_speed());
        }
        FacilityCommand::Toggle { base_id, facility_id } => {
            let facility = session.graph.require_facility_mut(base_id, facility_id)?;
            facility.toggle_active_state();
            let state = if facility.is_active { "active" } else { "inactive" };
            println!("Facility {} is now {}", facility_id, state);
        }
        FacilityCommand::Delete { base_id, facility_id } => {
            session.graph.require_facility_mut(base_id, facility_id)?;
            session.graph.delete_facility(base_id, facility_id);
            println!("Deleted facility {}", facility_id);
        }
        FacilityCommand::Show { base_id, facility_id } => {
            let facility = session
                .graph
                .require_base(base_id)?
                .facilities
                .get(&facility_id)
                .ok_or_else(|| TrackerError::invalid(EntityKind::Facility, facility_id))?;
            print!("{}", FacilityDetails(facility));
            return Ok(false);
        }
    }
    Ok(true)
}
