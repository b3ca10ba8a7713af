mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use photomanager_core::Vault;

/// photomgr: local photo catalog with albums, events and purchases
#[derive(Parser)]
#[command(name = "photomgr", version, about)]
struct Cli {
    /// Path to the catalog database
    #[arg(long, env = "PHOTOMGR_CATALOG", default_value_t = default_catalog_path())]
    catalog: String,

    /// Directory where imported photos are stored (remembered in the catalog)
    #[arg(long, env = "PHOTOMGR_STORAGE")]
    storage: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import, add, list or delete photos
    Photos {
        #[command(subcommand)]
        action: PhotosAction,
    },
    /// Manage albums and their ordered photos
    Albums {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Manage events and their ordered albums
    Events {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Record purchases and move them through their lifecycle
    Purchases {
        #[command(subcommand)]
        action: PurchasesAction,
    },
    /// Show or change catalog settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Serve JSON commands on stdin, one per line
    Bridge {
        /// Directory answered to `pick_directory` (omit to report "cancelled")
        #[arg(long)]
        pick_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum PhotosAction {
    /// Import every image file directly inside a directory
    Import {
        /// Directory to import from
        dir: PathBuf,
    },
    /// Add a single file
    Add {
        /// Path to the image file
        path: PathBuf,
        /// Display name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// List all photos, newest first
    Ls,
    /// Delete a photo and its stored file
    Rm {
        /// Photo ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum CollectionAction {
    /// Create a new one
    Create {
        /// Unique name
        name: String,
    },
    /// List all with their member counts
    Ls,
    /// Show members in display order
    Show {
        id: i64,
    },
    /// Rename
    Rename {
        id: i64,
        name: String,
    },
    /// Delete (members themselves are kept)
    Rm {
        id: i64,
    },
    /// Add a member, at the end unless an index is given
    Add {
        id: i64,
        member: i64,
        /// Explicit order index
        #[arg(long)]
        at: Option<i64>,
    },
    /// Remove a member
    Remove {
        id: i64,
        member: i64,
    },
    /// Reorder members; unlisted members keep their relative order after the listed ones
    Reorder {
        id: i64,
        #[arg(required = true, num_args = 1..)]
        members: Vec<i64>,
    },
}

#[derive(Subcommand)]
enum PurchasesAction {
    /// Record a purchase of the given photos
    Create {
        #[arg(required = true, num_args = 1..)]
        photo_ids: Vec<i64>,
    },
    /// List all purchases, newest first
    Ls,
    /// Show the photos of a purchase
    Show {
        id: i64,
    },
    /// Set the status: pending, processing, completed or cancelled
    Status {
        id: i64,
        status: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current settings and catalog totals
    Show,
    /// Set the purchase status policy: permissive or strict
    SetPolicy {
        policy: String,
    },
}

fn default_catalog_path() -> String {
    dirs_path().to_string_lossy().to_string()
}

fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".photomanager")
        .join("catalog.db")
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let catalog_path = PathBuf::from(&cli.catalog);
    let mut vault = Vault::open(&catalog_path)?;
    if let Some(dir) = &cli.storage {
        vault.set_storage_path(dir)?;
    }

    match cli.command {
        Commands::Photos { action } => match action {
            PhotosAction::Import { dir } => commands::photos::import(&vault, dir)?,
            PhotosAction::Add { path, name } => commands::photos::add(&vault, path, name)?,
            PhotosAction::Ls => commands::photos::list(&vault)?,
            PhotosAction::Rm { id } => commands::photos::rm(&vault, id)?,
        },
        Commands::Albums { action } => {
            run_collection(&mut vault, commands::collections::Kind::Album, action)?
        }
        Commands::Events { action } => {
            run_collection(&mut vault, commands::collections::Kind::Event, action)?
        }
        Commands::Purchases { action } => match action {
            PurchasesAction::Create { photo_ids } => {
                commands::purchases::create(&vault, &photo_ids)?
            }
            PurchasesAction::Ls => commands::purchases::list(&vault)?,
            PurchasesAction::Show { id } => commands::purchases::show(&vault, id)?,
            PurchasesAction::Status { id, status } => {
                commands::purchases::status(&mut vault, id, &status)?
            }
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&vault)?,
            ConfigAction::SetPolicy { policy } => commands::config::set_policy(&mut vault, &policy)?,
        },
        Commands::Bridge { pick_dir } => commands::bridge::run(vault, pick_dir)?,
    }

    Ok(())
}

fn run_collection(
    vault: &mut Vault,
    kind: commands::collections::Kind,
    action: CollectionAction,
) -> Result<()> {
    use commands::collections as c;
    match action {
        CollectionAction::Create { name } => c::create(vault, kind, &name),
        CollectionAction::Ls => c::list(vault, kind),
        CollectionAction::Show { id } => c::show(vault, kind, id),
        CollectionAction::Rename { id, name } => c::rename(vault, kind, id, &name),
        CollectionAction::Rm { id } => c::rm(vault, kind, id),
        CollectionAction::Add { id, member, at } => c::add(vault, kind, id, member, at),
        CollectionAction::Remove { id, member } => c::remove(vault, kind, id, member),
        CollectionAction::Reorder { id, members } => c::reorder(vault, kind, id, &members),
    }
}
