use anyhow::Result;
use cashbook::cli::Cli;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cashbook::logging::init_tracing(cli.verbose);
    cli.run().await
}
