use anyhow::{Context, Result};
use spell_package_btc_client::{BitcoinRpcClient, ProvenanceSource, RetryingRelay};
use spell_package_coordinator::{PackageCoordinator, PackageRequest};
use spell_package_primitives::codec::TransactionTemplate;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    cli::{PackageArgs, SignAndBroadcastArgs},
    config::Config,
    signer::{parse_signer_key, CliSigner},
};

pub(crate) async fn handle_sign_and_broadcast(
    args: SignAndBroadcastArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = Config::load(&args.package.config)?;

    let commit =
        TransactionTemplate::decode_hex(&args.commit_tx).context("decode commit template")?;
    let spell = TransactionTemplate::decode_hex(&args.spell_tx).context("decode spell template")?;

    sign_and_broadcast(&config, commit, spell, &args.package, cancel).await
}

/// Fetches provenance for both UTXOs, runs both signing phases and relays the package.
///
/// With `--dry-run`, the signed transactions are printed instead of relayed.
pub(crate) async fn sign_and_broadcast(
    config: &Config,
    commit: TransactionTemplate,
    spell: TransactionTemplate,
    args: &PackageArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let btc = &config.btc_client;
    let rpc = BitcoinRpcClient::new(
        btc.url.as_str(),
        Some((btc.user.clone(), btc.pass.clone())),
        btc.timeout,
    )
    .context("create bitcoin rpc client")?;
    let node = RetryingRelay::new(rpc, &btc.retry);

    let anchor = node.fetch(args.anchor).await.context("fetch anchor provenance")?;
    let funding = node.fetch(args.funding).await.context("fetch funding provenance")?;

    let signer = CliSigner::from_config(&config.signer)?;
    let signer_pubkey = match &args.signer_pubkey {
        Some(hex) => parse_signer_key(hex)?,
        None => signer
            .public_key()
            .context("--signer-pubkey is required with a remote signer")?,
    };

    let request = PackageRequest {
        commit_template: commit,
        spell_template: spell,
        anchor,
        funding,
        signer_pubkey,
    };
    let coordinator = PackageCoordinator::new(signer, node, config.coordinator.clone());

    if args.dry_run {
        let (package, _lease) = coordinator
            .sign_package(&request, cancel)
            .await
            .context("sign package")?;
        info!(commit = %package.commit.txid(), spell = %package.spell.txid(), "package signed");

        println!("{}", package.commit.encode_hex());
        println!("{}", package.spell.encode_hex());
        return Ok(());
    }

    let result = coordinator
        .sign_and_broadcast_package(request, cancel)
        .await
        .context("sign and broadcast package")?;
    info!(msg = ?result.package_msg, "package broadcast");

    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(())
}
