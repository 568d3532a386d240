use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    tourguide_cli::cli::run().await
}
