use crate::cli::client::ApiClient;
use crate::cli::utils::output;
use crate::cli::OutputFormat;

pub async fn handle(client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let health = client.get("/health").await?;
    output(&output_format, &health, |data| {
        format!(
            "Server {} is {} (store: {})",
            client.url(""),
            data["status"].as_str().unwrap_or("unknown"),
            data["store"].as_str().unwrap_or("unknown")
        )
    })
}
