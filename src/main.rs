pub mod types;
pub mod config;
pub mod query;
pub mod data;
pub mod processing;
pub mod render;
pub mod index;
pub mod session;
pub mod server;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one render cycle and write the map view as JSON
    Render {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
        #[arg(short = 't', long)]
        complaint_type: String,
        #[arg(short, long, default_value = types::ALL_BOROUGHS)]
        borough: String,
        /// Defaults to stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Serve the interactive map
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Render { config, complaint_type, borough, output } => {
            let app_config = config::AppConfig::load_from_file(config)?;
            let filter = types::FilterState::new(complaint_type, borough);
            let sessions = session::SessionManager::new();
            let client = reqwest::Client::new();

            let rendered = sessions
                .render(&app_config, &client, &filter)
                .await?
                .context("Render cycle was superseded")?;

            let writer: Box<dyn Write> = match output {
                Some(path) => Box::new(File::create(path)
                    .with_context(|| format!("Failed to create output file: {:?}", path))?),
                None => Box::new(io::stdout()),
            };
            let mut writer = BufWriter::new(writer);
            serde_json::to_writer_pretty(&mut writer, &rendered.view)?;
            writeln!(writer)?;
            writer.flush()?;

            if let Some(path) = output {
                println!(
                    "Wrote {} markers and {} boundaries to {:?}",
                    rendered.view.markers.markers.len(),
                    rendered.view.boundaries.polygons.len(),
                    path
                );
            }
        }
        Commands::Serve { config } => {
            println!("Serving map with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;
            server::start_server(app_config).await?;
        }
    }

    Ok(())
}
