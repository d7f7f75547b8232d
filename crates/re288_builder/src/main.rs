//! RE288 Builder CLI
//!
//! Statcast CSV → run expectancy tables and value scorecards
//! Statcast CSV → annotated dataset cache

#[cfg(feature = "cli")]
use anyhow::Result;
#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "re288_builder")]
#[command(about = "Count-aware run expectancy tables from pitch data", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Compute tables and scorecards for one season
    Compute {
        /// Season label (e.g., "2023")
        #[arg(long)]
        season: String,

        /// Input Statcast CSV file path
        #[arg(long, conflicts_with = "cache", required_unless_present = "cache")]
        csv: Option<PathBuf>,

        /// Input annotated dataset cache path
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Output directory
        #[arg(long)]
        out_dir: PathBuf,

        /// Model config file (JSON or YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Build an annotated dataset cache from CSV
    Cache {
        /// Input Statcast CSV file path
        #[arg(long)]
        csv: PathBuf,

        /// Output MsgPack+LZ4 file path
        #[arg(long)]
        out: PathBuf,

        /// Restrict to a configured season window
        #[arg(long)]
        season: Option<String>,

        /// Verify cache after building
        #[arg(long, default_value = "false")]
        verify: bool,

        /// Output metadata JSON file
        #[arg(long)]
        metadata: Option<PathBuf>,

        /// Model config file (JSON or YAML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the state reached from a key after one pitch outcome
    Next {
        /// State identifier (e.g., "132OXO")
        #[arg(long)]
        key: String,

        /// Pitch outcome: S, B or F
        #[arg(long)]
        outcome: String,
    },
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Compute {
            season,
            csv,
            cache,
            out_dir,
            config,
        } => {
            let config = re288_builder::resolve_config(config.as_deref())?;
            let source = match (csv, cache) {
                (Some(csv), _) => re288_builder::DatasetSource::Csv(csv),
                (None, Some(cache)) => re288_builder::DatasetSource::Cache(cache),
                (None, None) => anyhow::bail!("Either --csv or --cache is required"),
            };

            println!("⚾ Computing RE288 for season {}...", season);
            println!("   Input:  {}", source.path().display());
            println!("   Output: {}", out_dir.display());

            let meta = re288_builder::compute_season(&source, &season, &out_dir, &config)?;

            println!("\n✅ Season {} written", meta.season);
            println!("   Pitches:    {}", meta.events);
            println!(
                "   Situations: {} observed, {} unobserved",
                meta.observed_situations,
                meta.unobserved_situations.len()
            );
            println!("   Input hash: {}", meta.input_checksum);
        }

        Commands::Cache {
            csv,
            out,
            season,
            verify,
            metadata,
            config,
        } => {
            let config = re288_builder::resolve_config(config.as_deref())?;

            println!("🔨 Building annotated dataset cache...");
            println!("   CSV Input: {}", csv.display());
            println!("   Output:    {}", out.display());

            let (events, _stats) = re288_builder::load_events(&csv)?;
            let events = match season.as_deref() {
                Some(label) => re288_builder::select_season(events, label, &config),
                None => events,
            };
            let pitches = re288_core::annotate(&events);

            let meta = re288_builder::build_dataset_cache(
                &pitches,
                season.as_deref(),
                &out,
                re288_builder::dataset_cache::SCHEMA_VERSION,
            )?;

            print_metadata(&meta);

            if verify {
                verify_cache_integrity(&out, &meta.checksum)?;
            }

            if let Some(metadata_path) = metadata {
                save_metadata(&metadata_path, &meta)?;
            }
        }

        Commands::Next { key, outcome } => {
            let state = re288_core::StateKey::parse(&key)?;
            let outcome = re288_core::Outcome::from_code(&outcome)?;
            let next = re288_core::transition_key(state, outcome)?;
            println!("{}", next);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_metadata(meta: &re288_builder::CacheMetadata) {
    println!("\n✅ Cache built successfully!");
    println!("   Pitches:         {}", meta.events);
    println!(
        "   Original size:   {} bytes ({:.2} KB)",
        meta.original_size,
        meta.original_size as f64 / 1024.0
    );
    println!(
        "   Compressed size: {} bytes ({:.2} KB)",
        meta.compressed_size,
        meta.compressed_size as f64 / 1024.0
    );
    println!("   Compression:     {:.1}%", meta.compression_ratio * 100.0);
    println!("   Checksum:        {}", meta.checksum);
    println!("   Created:         {}", meta.created_at);
}

#[cfg(feature = "cli")]
fn verify_cache_integrity(cache_path: &Path, checksum: &str) -> Result<()> {
    println!("\n🔍 Verifying cache integrity...");
    let is_valid = re288_builder::verify_cache(cache_path, checksum)?;

    if is_valid {
        println!("✅ Cache verification passed");
        Ok(())
    } else {
        anyhow::bail!("❌ Cache verification failed - checksum mismatch!")
    }
}

#[cfg(feature = "cli")]
fn save_metadata(path: &Path, meta: &re288_builder::CacheMetadata) -> Result<()> {
    re288_builder::save_cache_metadata(path, meta)?;
    println!("\n📄 Metadata saved to: {}", path.display());
    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("re288_builder CLI is not available. Enable the 'cli' feature to use it.");
    std::process::exit(1);
}
