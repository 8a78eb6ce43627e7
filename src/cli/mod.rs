pub mod client;
pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use client::ApiClient;

#[derive(Parser)]
#[command(name = "platformctl")]
#[command(about = "Command-line client for the Platform Builder API")]
#[command(version)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "PLATFORM_API_URL",
        default_value = "http://localhost:5001",
        help = "Base URL of the API server"
    )]
    pub server: String,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Check server and store health")]
    Health,

    #[command(about = "Browse the category hierarchy")]
    Categories {
        #[command(subcommand)]
        cmd: commands::categories::CategoryCommands,
    },

    #[command(about = "Inspect and manage platforms")]
    Platforms {
        #[command(subcommand)]
        cmd: commands::platforms::PlatformCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let client = ApiClient::new(&cli.server);

    match cli.command {
        Commands::Health => commands::health::handle(&client, output_format).await,
        Commands::Categories { cmd } => commands::categories::handle(cmd, &client, output_format).await,
        Commands::Platforms { cmd } => commands::platforms::handle(cmd, &client, output_format).await,
    }
}
