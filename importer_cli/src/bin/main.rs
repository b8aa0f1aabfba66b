use anyhow::Result;
use clap::Parser;
use importer_cli::app::ImporterApp;

#[tokio::main]
async fn main() -> Result<()> {
    let app = ImporterApp::parse();

    app.run().await?;

    Ok(())
}
