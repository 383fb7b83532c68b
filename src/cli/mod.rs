//! Command-line interface for kidshelf.
//!
//! Provides commands for serving the catalog API, preparing the database,
//! inspecting configuration, and listing or reordering catalog entries.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::api;
use crate::catalog::{AgeRange, ContentType, EntityKind, ListFilter, Pagination, Projection, Scope};
use crate::config;
use crate::store::{Catalog, CatalogStore};

/// kidshelf - Ordered children's media catalog
#[derive(Parser, Debug)]
#[command(name = "kidshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API
    Serve {
        /// Address to bind to (defaults to the configured address)
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Create the home directory and database
    Init,

    /// Show resolved configuration (debug)
    Config,

    /// List catalog entries as an admin would see them
    List {
        /// Entity kind: content, categories, age-groups, settings
        kind: EntityKind,

        /// Content type filter
        #[arg(short = 't', long = "type")]
        content_type: Option<ContentType>,

        /// Case-insensitive substring search
        #[arg(short, long)]
        search: Option<String>,

        /// Age ("4") or age range ("3-6") the content must overlap
        #[arg(long)]
        age: Option<AgeRange>,

        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<i64>,

        /// Number of entries to skip
        #[arg(short, long)]
        offset: Option<i64>,
    },

    /// Replace the order of a manually ordered scope
    Reorder {
        /// Entity kind: content or categories
        kind: EntityKind,

        /// Content type (required for content)
        #[arg(short = 't', long = "type")]
        content_type: Option<ContentType>,

        /// Every id in the scope, in the new order
        #[arg(required = true, num_args = 1..)]
        ids: Vec<i64>,
    },
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Serve { address } => serve(address).await,
            Commands::Init => init().await,
            Commands::Config => show_config(),
            Commands::List {
                kind,
                content_type,
                search,
                age,
                limit,
                offset,
            } => {
                let filter = ListFilter {
                    content_type,
                    age,
                    search,
                    ..ListFilter::default()
                };
                list(kind, filter, Pagination { limit, offset }).await
            }
            Commands::Reorder {
                kind,
                content_type,
                ids,
            } => reorder(kind, content_type, ids).await,
        }
    }
}

/// Open the configured database
async fn open_catalog() -> Result<Catalog> {
    let cfg = config::config()?;

    if let Some(parent) = cfg.database.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    Catalog::open(&cfg.database, cfg.store_options())
        .await
        .with_context(|| format!("Failed to open catalog: {}", cfg.database.display()))
}

async fn serve(address: Option<String>) -> Result<()> {
    let cfg = config::config()?;
    let address = address.unwrap_or_else(|| cfg.address.clone());

    let catalog = open_catalog().await?;
    tracing::info!(database = %cfg.database.display(), "Catalog opened");

    api::serve(catalog, &address).await
}

async fn init() -> Result<()> {
    let cfg = config::config()?;

    std::fs::create_dir_all(&cfg.home)
        .with_context(|| format!("Failed to create home directory: {}", cfg.home.display()))?;
    open_catalog().await?;

    println!("Initialized catalog at {}", cfg.database.display());
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let cfg = config::config()?;

    println!("kidshelf configuration");
    println!("{}", "-".repeat(40));
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Database: {}", cfg.database.display());
    println!();
    println!("Server:");
    println!("  Address:  {}", cfg.address);
    println!();
    println!("Query:");
    println!("  Default limit:       {}", cfg.query.default_limit);
    println!("  Max limit:           {}", cfg.query.max_limit);
    println!("  Public category cap: {}", cfg.query.public_category_cap);

    Ok(())
}

async fn list(kind: EntityKind, filter: ListFilter, pagination: Pagination) -> Result<()> {
    let catalog = open_catalog().await?;

    let (rows, total) = catalog
        .read(move |store| list_rows(store, kind, &filter, pagination))
        .await?;

    if rows.is_empty() {
        println!("No {} entries found", kind);
        return Ok(());
    }

    println!("{:<8} {:<8} {:<10} {:<50}", "ID", "ORDER", "DETAIL", "NAME");
    println!("{}", "-".repeat(80));
    for row in &rows {
        println!(
            "{:<8} {:<8} {:<10} {:<50}",
            row.id,
            row.order.map(|o| o.to_string()).unwrap_or_else(|| "-".to_string()),
            row.detail,
            truncate(&row.name, 50)
        );
    }
    println!("\nShowing {} of {} {} entries", rows.len(), total, kind);

    Ok(())
}

/// One printable line of `list` output
struct ListRow {
    id: i64,
    order: Option<i64>,
    detail: String,
    name: String,
}

fn list_rows(
    store: &CatalogStore,
    kind: EntityKind,
    filter: &ListFilter,
    pagination: Pagination,
) -> crate::catalog::CatalogResult<(Vec<ListRow>, u64)> {
    match kind {
        EntityKind::Content => {
            let page = store.list_contents(filter, pagination, Projection::Admin)?;
            let total = page.total;
            let rows = page
                .data
                .into_iter()
                .map(|c| ListRow {
                    id: c.id,
                    order: Some(c.order_index),
                    detail: format!("{} {}-{}", c.content_type, c.age_min, c.age_max),
                    name: if c.is_active {
                        c.title
                    } else {
                        format!("{} (inactive)", c.title)
                    },
                })
                .collect();
            Ok((rows, total))
        }
        EntityKind::Category => {
            let page = store.list_categories(filter, pagination)?;
            let total = page.total;
            let rows = page
                .data
                .into_iter()
                .map(|c| ListRow {
                    id: c.id,
                    order: Some(c.order_index),
                    detail: String::new(),
                    name: c.name,
                })
                .collect();
            Ok((rows, total))
        }
        EntityKind::AgeGroup => {
            let page = store.list_age_groups(filter, pagination)?;
            let total = page.total;
            let rows = page
                .data
                .into_iter()
                .map(|g| ListRow {
                    id: g.id,
                    order: None,
                    detail: format!("{}-{}", g.age_min, g.age_max),
                    name: g.label,
                })
                .collect();
            Ok((rows, total))
        }
        EntityKind::Setting => {
            let page = store.list_settings(filter, pagination)?;
            let total = page.total;
            let rows = page
                .data
                .into_iter()
                .map(|s| ListRow {
                    id: s.id,
                    order: None,
                    detail: String::new(),
                    name: format!("{} = {}", s.key, s.value),
                })
                .collect();
            Ok((rows, total))
        }
    }
}

async fn reorder(kind: EntityKind, content_type: Option<ContentType>, ids: Vec<i64>) -> Result<()> {
    let scope = Scope::for_kind(kind, content_type)?;
    let catalog = open_catalog().await?;

    let slots = catalog
        .write(move |store| store.reorder(scope, &ids))
        .await
        .with_context(|| format!("Failed to reorder {}", scope))?;

    println!("Reordered {} ({} entries)", scope, slots.len());
    for slot in slots {
        println!("  {:>4}  {}", slot.order_index, slot.id);
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_command() {
        let cli = Cli::try_parse_from([
            "kidshelf", "list", "content", "--type", "video", "--age", "3-6", "--limit", "5",
        ])
        .unwrap();

        match cli.command {
            Commands::List {
                kind,
                content_type,
                age,
                limit,
                ..
            } => {
                assert_eq!(kind, EntityKind::Content);
                assert_eq!(content_type, Some(ContentType::Video));
                assert_eq!(age, Some(AgeRange { min: 3, max: 6 }));
                assert_eq!(limit, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_reorder_command() {
        let cli = Cli::try_parse_from(["kidshelf", "reorder", "categories", "3", "1", "2"]).unwrap();

        match cli.command {
            Commands::Reorder { kind, ids, .. } => {
                assert_eq!(kind, EntityKind::Category);
                assert_eq!(ids, vec![3, 1, 2]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_reorder_requires_ids() {
        assert!(Cli::try_parse_from(["kidshelf", "reorder", "categories"]).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a very long title", 10), "a very ...");
    }
}
