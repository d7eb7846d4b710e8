mod config;
mod error;
mod extract;
mod generator;
mod scrape;
mod sitemap;
mod slug;
mod sources;
mod store;
mod utils;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use config::{Category, RootPaths, Settings, DEFAULT_CONFIG_FILE};
use sources::SourceConfig;
use store::ContentStore;

#[derive(Parser)]
#[command(name = "sitegen", about = "Scrape game content and build the static site pages")]
struct Cli {
    /// Site root every configured path is resolved against
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    /// Settings file (default: <root>/sitegen.toml, optional)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch configured sources and replace each category's store
    Scrape {
        /// Only scrape this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Regenerate detail and index pages from the store
    Generate {
        /// Only generate this category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Rebuild sitemap.xml and urls.txt from curated and generated pages
    Sitemap,
    /// Show store, page and sitemap counts
    Stats,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let config_file = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.root.join(DEFAULT_CONFIG_FILE));
    let settings = Settings::load(&config_file, cli.config.is_some())?;
    let paths = settings.resolve_paths(&cli.root);
    info!(root = %cli.root.display(), config = %config_file.display(), "Settings loaded");

    match cli.command {
        Commands::Scrape { category } => {
            let categories = settings.select_categories(category.as_deref())?;
            let sources = SourceConfig::load(&paths.sources)?;
            let fetcher =
                scrape::HttpFetcher::new(&settings.user_agent, settings.fetch_timeout())?;
            let store = ContentStore::new(&paths.data_dir);

            let stats = scrape::scrape_all(&fetcher, &sources, &store, &categories)
                .await
                .context("Scrape aborted")?;
            for s in &stats {
                println!(
                    "Scraped {}: {} entities ({} sources ok, {} failed)",
                    s.category, s.entities, s.ok, s.errors
                );
            }
        }
        Commands::Generate { category } => {
            let categories = settings.select_categories(category.as_deref())?;
            let store = ContentStore::new(&paths.data_dir);

            for category in &categories {
                let stats =
                    generator::generate_category(&store, &paths, category, &settings.site_name)
                        .with_context(|| format!("Page generation for {} aborted", category))?;
                println!(
                    "Generated {}: {} pages ({} skipped) in {}",
                    stats.category,
                    stats.written,
                    stats.skipped,
                    stats.out_dir.display()
                );
            }
        }
        Commands::Sitemap => {
            let today = chrono::Utc::now().date_naive();
            let summary = sitemap::build(&settings, &paths, &settings.categories(), today)
                .context("Sitemap generation failed")?;
            println!("Sitemap: {}", paths.sitemap.display());
            println!("URL list: {}", paths.urls.display());
            summary.print();
        }
        Commands::Stats => {
            print_stats(&paths, &settings.categories())?;
        }
    }

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    Ok(())
}

fn print_stats(paths: &RootPaths, categories: &[Category]) -> anyhow::Result<()> {
    let store = ContentStore::new(&paths.data_dir);

    println!("{:<16} | {:>8} | {:>6}", "Category", "Entities", "Pages");
    println!("{}", "-".repeat(36));
    for category in categories {
        let entities = store.read(category)?.len();
        let pages = count_detail_pages(&paths.category_pages(category))?;
        println!("{:<16} | {:>8} | {:>6}", category, entities, pages);
    }

    let urls = sitemap::count_urls(&paths.sitemap)?;
    println!("\nSitemap URLs: {}", urls);
    Ok(())
}

fn count_detail_pages(dir: &std::path::Path) -> anyhow::Result<usize> {
    if !dir.exists() {
        return Ok(0);
    }
    let mut n = 0;
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if name.ends_with(".html") && name != generator::INDEX_FILE {
            n += 1;
        }
    }
    Ok(n)
}
