mod cli;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use model_zoo::{
    core::settings::resolve_config_path, models::UrlResolver, DownloadObserver, ModelZoo,
    TracingObserver, ZooSettings,
};
use tracing::metadata::LevelFilter;

use cli::{Args, Command};
use progress::ProgressBarObserver;

fn setup_logging() {
    let filter = std::env::var("MODEL_ZOO_LOG")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(LevelFilter::INFO);

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_target(false)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => resolve_config_path()?,
    };
    let settings = ZooSettings::load(&config_path)
        .with_context(|| format!("load settings from {}", config_path.display()))?;

    match args.command {
        Command::Get {
            architecture,
            path,
            no_decompress,
        } => {
            let zoo = ModelZoo::new(settings)?;
            let mut observer: Box<dyn DownloadObserver> = if args.quiet {
                Box::new(TracingObserver::default())
            } else {
                Box::new(ProgressBarObserver::default())
            };
            zoo.get(&architecture, &path, !no_decompress, &mut *observer)
                .with_context(|| format!("fetch {architecture} into {}", path.display()))?;
        }
        Command::Url { architecture } => {
            println!("{}", UrlResolver::from_settings(&settings).resolve(&architecture));
        }
        Command::Config { write } => {
            if write {
                settings.persist(&config_path)?;
                tracing::info!("wrote {}", config_path.display());
            }
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }
    Ok(())
}
