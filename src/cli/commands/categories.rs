use clap::Subcommand;

use crate::cli::client::ApiClient;
use crate::cli::utils::{output, render_tree};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum CategoryCommands {
    #[command(about = "Print the category tree, optionally rooted at one category")]
    Tree {
        #[arg(help = "Category id to start from")]
        id: Option<String>,
    },

    #[command(about = "Show a single category")]
    Show {
        #[arg(help = "Category id")]
        id: String,
    },
}

pub async fn handle(cmd: CategoryCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        CategoryCommands::Tree { id: None } => {
            let forest = client.get("/api/categories").await?;
            output(&output_format, &forest, |data| {
                render_tree(data.as_array().map(Vec::as_slice).unwrap_or_default())
            })
        }
        CategoryCommands::Tree { id: Some(id) } => {
            let node = client.get(&format!("/api/categories/{}/tree", id)).await?;
            output(&output_format, &node, |data| render_tree(std::slice::from_ref(data)))
        }
        CategoryCommands::Show { id } => {
            let category = client.get(&format!("/api/categories/{}", id)).await?;
            output(&output_format, &category, |data| {
                format!(
                    "{} ({})\n  depth: {}\n  path: {:?}\n  platform: {}",
                    data["name"].as_str().unwrap_or(""),
                    data["id"].as_str().unwrap_or(""),
                    data["depth"],
                    data["path"].as_str().unwrap_or(""),
                    data["platformId"].as_str().unwrap_or("-")
                )
            })
        }
    }
}
