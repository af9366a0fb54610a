use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gigdex_core::PlatformRecord;
use gigdex_discovery::{compare, discover, encode, featured, from_query_string, to_query_string};
use gigdex_storage::CatalogSnapshot;
use gigdex_web::WebConfig;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "gigdex-cli")]
#[command(about = "gigdex platform directory command-line interface")]
struct Cli {
    /// YAML catalog to read (defaults to GIGDEX_CATALOG_PATH or ./platforms.yaml)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the web site
    Serve,
    /// Filter and sort the catalog with a shareable query string, e.g. "category=General&sort=name"
    Search {
        #[arg(default_value = "")]
        query: String,
        #[arg(long)]
        json: bool,
    },
    /// Load the catalog and report validation errors
    Validate,
    /// List featured platforms
    Featured,
    /// Show platforms side by side
    Compare {
        #[arg(required = true)]
        slugs: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = WebConfig::from_env();
    if let Some(path) = cli.catalog {
        config.catalog_path = path;
    }

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => gigdex_web::serve(config).await?,
        Commands::Search { query, json } => {
            let snapshot = load_snapshot(&config).await?;
            let selection = from_query_string(&query);
            let result = discover(snapshot.records(), &selection);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                for record in result.iter() {
                    print_row(record);
                }
                println!(
                    "{} platform(s); share: /platforms?{}",
                    result.count,
                    to_query_string(&encode(&selection))
                );
            }
        }
        Commands::Validate => {
            let snapshot = load_snapshot(&config).await?;
            println!(
                "catalog ok: {} platforms, fingerprint {}",
                snapshot.len(),
                snapshot.fingerprint()
            );
        }
        Commands::Featured => {
            let snapshot = load_snapshot(&config).await?;
            for record in featured(snapshot.records()) {
                print_row(record);
            }
        }
        Commands::Compare { slugs } => {
            let snapshot = load_snapshot(&config).await?;
            let comparison = compare(snapshot.records(), &slugs);
            for record in &comparison.platforms {
                println!(
                    "{}\n  category:   {}\n  rating:     {:.1}\n  difficulty: {}\n  fees:       {}",
                    record.name, record.category, record.rating, record.difficulty, record.fees
                );
            }
            if !comparison.missing.is_empty() {
                eprintln!("not found: {}", comparison.missing.join(", "));
            }
        }
    }

    Ok(())
}

async fn load_snapshot(config: &WebConfig) -> Result<CatalogSnapshot> {
    config
        .catalog_store()?
        .load()
        .await
        .with_context(|| format!("loading catalog {}", config.catalog_path.display()))
}

fn print_row(record: &PlatformRecord) {
    println!(
        "{:>4.1}  {:<28} {:<14} {}",
        record.rating, record.name, record.category, record.difficulty
    );
}
