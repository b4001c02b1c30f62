//! Command-line front end for the storage hierarchy.
//!
//! # Responsibility
//! - Load the hierarchy from a local SQLite store or a REST base URL.
//! - Print trees, breadcrumbs, delete previews and overview stats.

use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use stowtree_core::db::{open_db, open_db_from_config};
use stowtree_core::tree::traverse::{walk, Visit};
use stowtree_core::{
    direct_sub_container_count, init_logging_from_config, materials_by_subcategory,
    search_items, total_items, CoreConfig, DashboardStats, RecordSource, RestRecordSource,
    SqliteRecordSource, StorageService, TreeNode,
};

#[derive(Parser)]
#[command(name = "stowtree")]
#[command(version, about = "Storage hierarchy inspector", long_about = None)]
struct Cli {
    /// SQLite database file (defaults to STOWTREE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// REST base URL; overrides the local database
    #[arg(long, global = true)]
    api: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the full hierarchy
    Tree,
    /// Print the breadcrumb of a container or area
    Path {
        id: String,
        #[arg(long, default_value = "-")]
        separator: String,
    },
    /// Preview a cascade delete without committing it
    PlanDelete { id: String },
    /// Delete a container and its descendants; items are relocated
    Delete {
        id: String,
        /// Skip the confirmation preview
        #[arg(long)]
        yes: bool,
    },
    /// Print overview statistics
    Stats,
    /// Group items by subcategory
    Materials,
    /// Find items by keyword across name, specification, category and description
    Search { keyword: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from_config(&config)?;

    match cli.api.clone().or_else(|| config.api_base.clone()) {
        Some(base_url) => {
            let source = RestRecordSource::new(base_url, config.http_timeout)
                .map_err(|err| err.to_string())?;
            execute(StorageService::new(source), &cli)
        }
        None => {
            let conn = match &cli.db {
                Some(path) => open_db(path),
                None => open_db_from_config(&config),
            }
            .map_err(|err| err.to_string())?;
            execute(StorageService::new(SqliteRecordSource::new(&conn)), &cli)
        }
    }
}

fn execute<S: RecordSource>(mut service: StorageService<S>, cli: &Cli) -> Result<(), String> {
    let snapshot = service.refresh();
    for notice in snapshot.notices() {
        eprintln!("warning: {} unavailable: {}", notice.slice, notice.message);
    }

    match &cli.command {
        Command::Tree => {
            if cli.json {
                println!("{}", to_json(snapshot.tree())?);
                return Ok(());
            }
            print_tree(snapshot.tree().roots());
            let report = snapshot.attach_report();
            if report.missing_from_tree() > 0 {
                println!("({} item(s) not placed in any container)", report.missing_from_tree());
            }
        }
        Command::Path { id, separator } => {
            let resolution = service.resolve_location(id);
            if cli.json {
                println!("{}", to_json(&resolution)?);
            } else {
                println!("{}", resolution.display_or_placeholder(separator));
            }
        }
        Command::PlanDelete { id } => {
            let plan = service.plan_delete(id).map_err(|err| err.to_string())?;
            if cli.json {
                println!("{}", to_json(&plan)?);
            } else {
                println!("{}", plan.confirmation_message());
                println!("containers: {}", plan.container_ids_to_delete.join(", "));
                println!("items to move: {}", plan.items_to_move.len());
            }
        }
        Command::Delete { id, yes } => {
            if !yes {
                let plan = service.plan_delete(id).map_err(|err| err.to_string())?;
                println!("{}", plan.confirmation_message());
                println!("re-run with --yes to commit");
                return Ok(());
            }
            let plan = service.delete_container(id).map_err(|err| err.to_string())?;
            println!(
                "deleted {} container(s), moved {} item(s)",
                plan.container_ids_to_delete.len(),
                plan.items_to_move.len()
            );
        }
        Command::Stats => {
            let stats = DashboardStats::compute(&snapshot, Local::now().date_naive());
            if cli.json {
                println!("{}", to_json(&stats)?);
            } else {
                print_stats(&stats);
            }
        }
        Command::Materials => {
            let groups = materials_by_subcategory(snapshot.items());
            if cli.json {
                println!("{}", to_json(&groups)?);
                return Ok(());
            }
            for group in &groups {
                println!(
                    "{} ({} record(s), total {})",
                    group.subcategory,
                    group.items.len(),
                    group.total_quantity
                );
                for item in &group.items {
                    println!("  - {} x{} {}", item.name, item.quantity, item.unit);
                }
            }
        }
        Command::Search { keyword } => {
            let hits = search_items(snapshot.items(), keyword);
            if cli.json {
                println!("{}", to_json(&hits)?);
                return Ok(());
            }
            for item in hits {
                let location = match item.holder_id.as_deref() {
                    Some(holder_id) => service.location_label(holder_id, " > "),
                    None => "unassigned".to_string(),
                };
                println!("{} x{} {} @ {}", item.name, item.quantity, item.unit, location);
            }
        }
    }
    Ok(())
}

fn print_tree(roots: &[TreeNode]) {
    walk(roots, |node, ancestors| {
        let indent = "  ".repeat(ancestors.len());
        println!(
            "{}{} [{}] ({} item(s), {} sub-container(s)) id={}",
            indent,
            node.name,
            node.type_tag,
            total_items(Some(node)),
            direct_sub_container_count(Some(node)),
            node.id
        );
        for item in &node.items {
            println!("{}  - {} x{} {}", indent, item.name, item.quantity, item.unit);
        }
        Visit::Continue
    });
}

fn print_stats(stats: &DashboardStats) {
    println!("rooms:          {}", stats.room_count);
    println!("containers:     {}", stats.container_count);
    println!("item records:   {}", stats.item_record_count);
    println!("total quantity: {}", stats.total_quantity);
    println!("subcategories:  {}", stats.subcategory_count);
    println!("low stock:      {}", stats.low_stock_count);
    println!("expiring soon:  {}", stats.expiring_soon_count);
    println!("expired:        {}", stats.expired_count);
    println!("unassigned:     {}", stats.unassigned_count);
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| err.to_string())
}
