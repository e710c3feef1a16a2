//! Banked XP - command line entry point
//!
//! Loads the catalog and the persisted maps, applies the requested change,
//! and prints the resulting banked experience.

use banked_xp::catalog::{load_catalog, Catalog};
use banked_xp::containers::{ContainerKind, ContainerSnapshot};
use banked_xp::core::config::BankedConfig;
use banked_xp::core::error::Result;
use banked_xp::core::types::{ActivityId, ItemId, Skill};
use banked_xp::links::LinkTarget;
use banked_xp::persistence::{JsonFileStore, PersistWorker};
use banked_xp::resolver::{BankedItemMap, Resolution};
use banked_xp::session::{BankSession, UpdateReport};

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

/// Banked XP - experience available from stored items
#[derive(Parser, Debug)]
#[command(name = "banked-xp")]
#[command(about = "Work out the skill experience locked up in banked items")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the persisted maps (overrides the config file)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Catalog file (overrides the config file and the embedded catalog)
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print banked experience per item
    Show {
        /// Only items with experience in this skill
        #[arg(long)]
        skill: Option<String>,
        /// Print the mapping as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print owned quantities across all containers
    Owned,
    /// Replace a container's contents from a JSON file ({"item id": quantity})
    Import {
        #[arg(long, value_enum)]
        container: ContainerArg,
        #[arg(long)]
        file: PathBuf,
    },
    /// Choose the conversion for an item with several options
    Link(LinkArgs),
    /// Remove a previously chosen conversion
    Unlink(LinkArgs),
    /// Validate the catalog and exit
    CheckCatalog,
}

#[derive(Args, Debug)]
struct LinkArgs {
    /// Source item id
    item: u32,
    /// Activity to link to
    #[arg(long, conflicts_with = "output", required_unless_present = "output")]
    activity: Option<String>,
    /// Downstream item to link to
    #[arg(long)]
    output: Option<u32>,
}

impl LinkArgs {
    fn target(&self) -> LinkTarget {
        match (&self.activity, self.output) {
            (Some(activity), _) => LinkTarget::Activity(ActivityId::new(activity.as_str())),
            (None, Some(output)) => LinkTarget::Item(ItemId(output)),
            // clap enforces one of the two
            (None, None) => unreachable!("clap requires --activity or --output"),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ContainerArg {
    Bank,
    SeedVault,
}

impl From<ContainerArg> for ContainerKind {
    fn from(arg: ContainerArg) -> Self {
        match arg {
            ContainerArg::Bank => ContainerKind::Bank,
            ContainerArg::SeedVault => ContainerKind::SeedVault,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("banked_xp=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => BankedConfig::load(path)?,
        None => BankedConfig::default(),
    };
    if let Some(dir) = cli.data_dir.clone() {
        config.data_dir = dir;
    }
    if let Some(path) = cli.catalog.clone() {
        config.catalog_path = Some(path);
    }

    let catalog = match &config.catalog_path {
        Some(path) => load_catalog(path)?,
        None => Catalog::with_defaults()?,
    };
    tracing::info!(
        "Catalog ready: {} items, {} activities",
        catalog.items().count(),
        catalog.activities().len()
    );

    if let Command::CheckCatalog = cli.command {
        println!("Catalog OK");
        return Ok(());
    }
    let skill_filter = match &cli.command {
        Command::Show { skill: Some(name), .. } => Some(name.parse::<Skill>()?),
        _ => None,
    };

    let rt = Runtime::new()?;
    let guard = rt.enter();

    let store = Arc::new(JsonFileStore::new(config.data_dir.clone()));
    let (worker, writer) = PersistWorker::spawn(store.clone());
    let mut session = BankSession::new(Arc::new(catalog), config, Box::new(worker));

    let restored = session.restore(store.as_ref())?;
    for (kind, err) in &restored.failures {
        eprintln!("Warning: could not load {}: {}", kind, err);
    }

    match cli.command {
        Command::Show { json, .. } => {
            let map = session.current_banked_items();
            if json {
                println!("{}", serde_json::to_string_pretty(&*map)?);
            } else {
                print_banked(&map, skill_filter)?;
            }
        }
        Command::Owned => {
            for (id, qty) in session.current_owned_items().iter() {
                let name = session.catalog().item(id).map(|i| i.name.as_str()).unwrap_or("?");
                println!("{:>7}  {:<24} {}", id, name, qty);
            }
        }
        Command::Import { container, file } => {
            let content = std::fs::read_to_string(&file)?;
            let snapshot: ContainerSnapshot = serde_json::from_str(&content)?;
            let report = session.replace_container(container.into(), snapshot)?;
            print_report(&report);
            print_banked(&session.current_banked_items(), None)?;
        }
        Command::Link(args) => {
            let report = session.set_link(ItemId(args.item), args.target())?;
            print_report(&report);
            print_banked(&session.current_banked_items(), None)?;
        }
        Command::Unlink(args) => {
            let report = session.remove_link(ItemId(args.item), &args.target())?;
            print_report(&report);
            print_banked(&session.current_banked_items(), None)?;
        }
        Command::CheckCatalog => {}
    }

    session.shutdown();
    drop(session);
    drop(guard);

    let stats = rt.block_on(writer).unwrap_or_default();
    if stats.failed > 0 {
        eprintln!("Warning: {} saves failed (see log)", stats.failed);
    }

    Ok(())
}

fn print_report(report: &UpdateReport) {
    if !report.recomputed {
        println!("No change.");
    }
    for (kind, reason) in report.persist_failures() {
        eprintln!("Warning: could not save {}: {}", kind, reason);
    }
}

fn print_banked(map: &BankedItemMap, skill: Option<Skill>) -> Result<()> {
    println!();
    println!("{:>7}  {:<24} {:>9} {:>7} {:>11}  {}", "ID", "ITEM", "QTY", "XP/EA", "TOTAL XP", "CHAIN");
    for banked in map.iter() {
        if let Some(skill) = skill {
            if !banked.skills.iter().any(|s| s.skill == skill) {
                continue;
            }
        }
        if banked.quantity == 0 {
            continue;
        }

        let chain = match &banked.resolution {
            Resolution::Unresolved { candidates } => {
                let options: Vec<_> = candidates.iter().map(|c| c.as_str()).collect();
                format!("needs link: {}", options.join(" | "))
            }
            Resolution::Terminal => "-".to_string(),
            Resolution::Single | Resolution::Linked => {
                let steps: Vec<_> = banked.chain.iter().map(|c| c.as_str()).collect();
                let mut text = steps.join(" -> ");
                if let Some(pending) = banked.pending_link {
                    text.push_str(&format!(" (item {} needs link)", pending));
                }
                text
            }
        };

        println!(
            "{:>7}  {:<24} {:>9} {:>7} {:>11}  {}",
            banked.item,
            banked.name,
            banked.quantity,
            banked.experience_per_unit,
            banked.total_experience,
            chain
        );
    }

    println!();
    for (skill, total) in map.skill_totals()? {
        println!("{:<14} {:>11} xp", skill, total);
    }
    println!("{:<14} {:>11} xp", "Total", map.total_experience()?);
    Ok(())
}
