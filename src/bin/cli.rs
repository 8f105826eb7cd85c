use clap::{Parser, Subcommand};
use exercise_catalog::{
    apply::{apply_updates, plan_updates},
    config::ImageInput,
    open_store,
    report::{self, audit, read_artifact, write_audit},
    CatalogService, ImageMatcher, MatcherConfig, MigrationOutcome, Snapshot,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "exercise-catalog")]
#[command(about = "Exercise catalog batch tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match image filenames to exercises and write the mapping artifacts
    Map {
        /// Matcher config (JSON); defaults to the data/ layout
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Scan this directory instead of reading the image list
        #[arg(long)]
        images_dir: Option<PathBuf>,

        /// URL prefix for scanned images
        #[arg(long, default_value = "/static/images")]
        url_prefix: String,
    },

    /// Write a review report of ambiguous or weak matches
    Audit {
        /// Mapping artifact (JSON)
        #[arg(short, long)]
        artifact: PathBuf,

        /// Audit report output (JSON)
        #[arg(short, long)]
        out: PathBuf,
    },

    /// Add matched images to the exercise source files
    Apply {
        /// Mapping artifact (JSON)
        #[arg(short, long)]
        artifact: PathBuf,

        /// Also apply entries flagged ambiguous
        #[arg(long)]
        include_ambiguous: bool,
    },

    /// Copy the v1 JSON catalog into an empty store
    Migrate {
        /// Store connection string or path
        #[arg(short, long, default_value = "data/exercises.db")]
        database: String,

        /// v1 exercises file
        #[arg(long, default_value = "data/exercises.json")]
        v1: PathBuf,
    },

    /// Show catalog statistics
    Stats {
        /// Store connection string or path
        #[arg(short, long, default_value = "data/exercises.db")]
        database: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Map {
            config,
            images_dir,
            url_prefix,
        } => {
            let mut config = match config {
                Some(path) => MatcherConfig::from_file(&path)?,
                None => MatcherConfig::default(),
            };
            if let Some(root) = images_dir {
                config.images = ImageInput::Directory { root, url_prefix };
            }

            let snapshot = Snapshot::load(config.images.load(), &config.record_sources()).await;
            let run = ImageMatcher::new(config.priority()).run(&snapshot);
            let paths = config.artifact_paths();
            report::emit(&run.entries, &paths)?;

            let summary = run.summary;
            println!("🖼️  Processed {} images", summary.processed);
            println!("   Matched: {}", summary.matched);
            println!("   Exact: {}", summary.exact);
            println!("   Ambiguous: {}", summary.ambiguous);
            println!("   Unmatched: {}", summary.unmatched);
            println!("\n✅ Wrote {}", paths.json.display());
            println!("✅ Wrote {}", paths.csv.display());
        }

        Commands::Audit { artifact, out } => {
            let entries = read_artifact(&artifact)?;
            let records = audit(&entries);
            write_audit(&out, &records)?;

            let flagged = records.iter().filter(|r| r.ambiguous).count();
            println!("🔎 {} of {} entries need review", flagged, records.len());
            println!("✅ Wrote {}", out.display());
        }

        Commands::Apply {
            artifact,
            include_ambiguous,
        } => {
            let entries = read_artifact(&artifact)?;
            let plan = plan_updates(&entries, include_ambiguous);
            let summary = apply_updates(&plan)?;

            println!("📝 Images added: {}", summary.images_added);
            for path in &summary.files_updated {
                println!("   Updated: {}", path.display());
            }
            for path in &summary.files_skipped {
                println!("   Skipped: {}", path.display());
            }
            if summary.ids_missing > 0 {
                println!("   Ids not found: {}", summary.ids_missing);
            }
        }

        Commands::Migrate { database, v1 } => {
            let service = CatalogService::new(open_store(&database).await?);
            match service.migrate_from_v1(&v1).await? {
                MigrationOutcome::AlreadyMigrated { count } => {
                    println!("ℹ️  Store already holds {} exercises, nothing to do", count);
                }
                MigrationOutcome::Migrated { count } => {
                    println!("✅ Migrated; store now holds {} exercises", count);
                }
            }
        }

        Commands::Stats { database } => {
            let service = CatalogService::new(open_store(&database).await?);
            let stats = service.stats().await?;

            println!("📊 Catalog Statistics ({}):", stats.database_type);
            println!("   Total exercises: {}", stats.total_exercises);
            for (title, counts) in [
                ("Muscle groups", &stats.muscle_groups),
                ("Difficulty levels", &stats.difficulty_levels),
                ("Equipment", &stats.equipment_types),
            ] {
                println!("   {}:", title);
                for (key, count) in counts {
                    println!("     {}: {}", key, count);
                }
            }
        }
    }

    Ok(())
}
