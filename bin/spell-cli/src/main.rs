//! CLI to inspect spell package templates, sign them and broadcast them as a package.

mod cli;
mod config;
mod handlers;
mod signer;

use anyhow::{Error, Result};
use clap::Parser;
use spell_package_common::logging::{self, LoggerConfig};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::handlers::{inspect, prove, sign};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init(LoggerConfig::with_base_name("spell-cli"));

    let cli = cli::Cli::parse();

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, abandoning attempt");
                cancel.cancel();
            }
        }
    });

    match cli.command {
        cli::Commands::Inspect(args) => inspect::handle_inspect(args),
        cli::Commands::SignAndBroadcast(args) => {
            sign::handle_sign_and_broadcast(args, &cancel).await
        }
        cli::Commands::ProveAndBroadcast(args) => {
            prove::handle_prove_and_broadcast(args, &cancel).await
        }
    }
}
