mod annotation;
mod core;
mod session;
mod shared;
mod utils;
mod video;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::shared::{AmbiguityPolicy, PrepConfig};
use crate::utils::logger;
use crate::video::OpenCvBackend;

#[derive(Parser)]
#[command(author, version, about = "Cut annotated hand-trajectory spans into a train/validation/test clip dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigOpts {
    /// `key = value` settings file
    #[arg(long)]
    config: Option<PathBuf>,
}

impl ConfigOpts {
    fn load(&self) -> Result<PrepConfig> {
        Ok(PrepConfig::load(self.config.as_deref())?)
    }
}

#[derive(Args)]
struct SeedOpts {
    /// Seed for clip names and split assignment (random when omitted)
    #[arg(long)]
    seed: Option<u64>,
}

impl SeedOpts {
    fn apply(&self, config: &mut PrepConfig) {
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

#[derive(Args)]
struct LocatorOpts {
    /// What to do with a session folder holding several annotation or video candidates
    #[arg(long, value_enum)]
    on_ambiguous: Option<AmbiguityPolicy>,
}

impl LocatorOpts {
    fn apply(&self, config: &mut PrepConfig) {
        if let Some(policy) = self.on_ambiguous {
            config.locator.on_ambiguous = policy;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract labeled clips from every session under ROOT_DIR and split them into DEST_DIR
    Run {
        root_dir: PathBuf,
        dest_dir: PathBuf,
        #[command(flatten)]
        config: ConfigOpts,
        #[command(flatten)]
        seed: SeedOpts,
        #[command(flatten)]
        locator: LocatorOpts,
    },
    /// Split the staged clips already in DEST_DIR (finishes an interrupted partition)
    Partition {
        dest_dir: PathBuf,
        #[command(flatten)]
        config: ConfigOpts,
        #[command(flatten)]
        seed: SeedOpts,
    },
    /// List the session folders found under ROOT_DIR
    Scan {
        root_dir: PathBuf,
        #[command(flatten)]
        config: ConfigOpts,
        #[command(flatten)]
        locator: LocatorOpts,
    },
}

fn main() -> Result<()> {
    logger::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Run {
            root_dir,
            dest_dir,
            config,
            seed,
            locator,
        } => {
            let mut config = config.load()?;
            seed.apply(&mut config);
            locator.apply(&mut config);
            logger::info(&format!(
                "run: root={} dest={} seed={:?}",
                root_dir.display(),
                dest_dir.display(),
                config.seed
            ));
            let mut rng = config.rng();
            let summary = crate::core::run(&OpenCvBackend, root_dir, dest_dir, &config, &mut rng)
                .map_err(|e| {
                    logger::error(&format!("run failed: {:#}", e));
                    e
                })?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Commands::Partition { dest_dir, config, seed } => {
            let mut config = config.load()?;
            seed.apply(&mut config);
            let mut rng = config.rng();
            let reports = crate::core::partition_all(dest_dir, &config, &mut rng).map_err(|e| {
                logger::error(&format!("partition failed: {:#}", e));
                e
            })?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        Commands::Scan { root_dir, config, locator } => {
            let mut config = config.load()?;
            locator.apply(&mut config);
            let scan = crate::session::locate_sessions(root_dir, &config.locator)?;
            println!("{}", serde_json::to_string_pretty(&scan)?);
        }
    }

    Ok(())
}
