use anyhow::Result;
use mmin_cli::app;

#[tokio::main]
async fn main() -> Result<()> {
    app::run().await
}
