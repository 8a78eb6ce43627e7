use clap::Subcommand;
use futures::future::try_join_all;
use serde_json::{json, Value};

use crate::cli::client::ApiClient;
use crate::cli::utils::{output, output_success, render_platform};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum PlatformCommands {
    #[command(about = "List all platforms")]
    List,

    #[command(about = "Show one or more platforms")]
    Show {
        #[arg(required = true, help = "Platform ids")]
        ids: Vec<String>,
    },

    #[command(about = "Activate a platform, creating its category")]
    Activate {
        #[arg(help = "Platform id")]
        id: String,
    },

    #[command(about = "Delete a platform and its category")]
    Delete {
        #[arg(help = "Platform id")]
        id: String,
    },
}

pub async fn handle(cmd: PlatformCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PlatformCommands::List => {
            let platforms = client.get("/api/platforms").await?;
            output(&output_format, &platforms, |data| {
                let lines: Vec<String> = data
                    .as_array()
                    .map(|all| all.iter().map(render_platform).collect())
                    .unwrap_or_default();
                if lines.is_empty() {
                    "No platforms".to_string()
                } else {
                    lines.join("\n")
                }
            })
        }
        PlatformCommands::Show { ids } => {
            let paths: Vec<String> = ids.iter().map(|id| format!("/api/platforms/{}", id)).collect();
            let platforms = try_join_all(paths.iter().map(|path| client.get(path))).await?;
            let data = Value::Array(platforms);
            output(&output_format, &data, |data| {
                data.as_array()
                    .map(|all| all.iter().map(render_platform).collect::<Vec<_>>().join("\n"))
                    .unwrap_or_default()
            })
        }
        PlatformCommands::Activate { id } => {
            let platform = client
                .put(&format!("/api/platforms/{}", id), &json!({ "active": true }))
                .await?;
            let category = platform["category"]["id"].as_str().unwrap_or("-").to_string();
            output_success(
                &output_format,
                &format!("Platform {} is active (category {})", id, category),
                &platform,
            )
        }
        PlatformCommands::Delete { id } => {
            let result = client.delete(&format!("/api/platforms/{}", id)).await?;
            output_success(&output_format, &format!("Deleted platform {}", id), &result)
        }
    }
}
