use anyhow::Result;
use clap::Parser;
use courtside::app::{cli::Cli, handler};

#[tokio::main]
async fn main() -> Result<()> {
    handler::run(Cli::parse()).await
}
