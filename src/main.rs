pub mod types;
pub mod config;
pub mod data;
pub mod aggregation;
pub mod server;

use aggregation::DashboardContext;
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the dashboard API
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the bar and pie views for a province as JSON
    Summary {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        /// Province to summarize; omit for the empty selection
        #[arg(short, long)]
        province: Option<String>,
    },
    /// Read province selections from stdin, one per line, and print the views after each
    Explore {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// List the selectable provinces
    Provinces {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

fn load_context(path: &Path) -> anyhow::Result<(config::AppConfig, DashboardContext)> {
    let app_config = config::AppConfig::load_from_file(path)?;
    let table = data::load_data(&app_config)?;
    let context = DashboardContext::new(table, app_config.dashboard.clone());
    Ok((app_config, context))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Serve { config } => {
            info!("Serving dashboard with config: {:?}", config);
            let (app_config, context) = load_context(config)?;
            server::start_server(app_config, context).await?;
        }
        Commands::Summary { config, province } => {
            let (_, context) = load_context(config)?;
            let views = aggregation::chart_views(&context, province.as_deref());
            println!("{}", serde_json::to_string_pretty(&views)?);
        }
        Commands::Explore { config } => {
            let (_, context) = load_context(config)?;
            let mut state = aggregation::SelectionState::new(&context);
            println!("{}", serde_json::to_string_pretty(state.current())?);

            for line in std::io::stdin().lock().lines() {
                let line = line?;
                let selection = Some(line.as_str()).filter(|p| !p.is_empty());
                let views = state.select(&context, selection);
                println!("{}", serde_json::to_string_pretty(views)?);
            }
        }
        Commands::Provinces { config } => {
            let (_, context) = load_context(config)?;
            for province in context.province_options() {
                println!("{}", province);
            }
        }
    }

    Ok(())
}
