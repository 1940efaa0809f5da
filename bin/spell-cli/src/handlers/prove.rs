use std::fs;

use anyhow::{Context, Result};
use serde_json::Value;
use spell_package_producer::{ProverClient, RetryingProducer, TemplateProducer};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{cli::ProveAndBroadcastArgs, config::Config, handlers::sign};

pub(crate) async fn handle_prove_and_broadcast(
    args: ProveAndBroadcastArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = Config::load(&args.package.config)?;
    let prover = config
        .prover
        .as_ref()
        .context("the config file has no [prover] section")?;

    let request: Value = fs::read_to_string(&args.request)
        .with_context(|| format!("read prover request {}", args.request.display()))
        .and_then(|contents| serde_json::from_str(&contents).context("parse prover request"))?;

    let client = ProverClient::new(prover.url.as_str(), prover.timeout)
        .context("create prover client")?;
    let producer = RetryingProducer::new(client, &prover.retry);

    let package = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            warn!("interrupted while proving");
            anyhow::bail!("cancelled while waiting for the prover");
        }
        package = producer.produce(&request) => package.context("prove spell")?,
    };
    info!(
        commit = %package.commit.txid(),
        spell = %package.spell.txid(),
        "received templates"
    );

    sign::sign_and_broadcast(&config, package.commit, package.spell, &args.package, cancel).await
}
