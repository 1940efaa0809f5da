use std::path::PathBuf;

use clap::{ArgGroup, Args, Parser, Subcommand};
use spell_package_primitives::utxo::UtxoRef;

#[derive(Parser)]
#[command(
    name = "spell-cli",
    about = "Sign a spell package in two phases and broadcast it atomically",
    version
)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub(crate) enum Commands {
    Inspect(InspectArgs),

    SignAndBroadcast(SignAndBroadcastArgs),

    ProveAndBroadcast(ProveAndBroadcastArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Decode a transaction template and print its inputs and outputs", version)]
#[command(group(ArgGroup::new("source").required(true).args(["hex", "file"])))]
pub(crate) struct InspectArgs {
    #[arg(long, help = "the hex-encoded transaction")]
    pub(crate) hex: Option<String>,

    #[arg(long, help = "a file containing the hex-encoded transaction")]
    pub(crate) file: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Sign a commit and spell template and broadcast them as a package", version)]
pub(crate) struct SignAndBroadcastArgs {
    #[arg(long, env = "COMMIT_TX", help = "the hex-encoded commit template")]
    pub(crate) commit_tx: String,

    #[arg(long, env = "SPELL_TX", help = "the hex-encoded spell template")]
    pub(crate) spell_tx: String,

    #[clap(flatten)]
    pub(crate) package: PackageArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Ask the prover for templates, then sign and broadcast them", version)]
pub(crate) struct ProveAndBroadcastArgs {
    #[arg(long, help = "the path to the JSON request forwarded to the prover")]
    pub(crate) request: PathBuf,

    #[clap(flatten)]
    pub(crate) package: PackageArgs,
}

#[derive(Args, Debug, Clone)]
pub(crate) struct PackageArgs {
    #[arg(
        long,
        short = 'c',
        env = "SPELL_CLI_CONFIG",
        default_value = "config.toml",
        help = "the path to the config file"
    )]
    pub(crate) config: PathBuf,

    #[arg(long, env = "ANCHOR_UTXO", help = "the anchor utxo as <txid>:<vout>")]
    pub(crate) anchor: UtxoRef,

    #[arg(long, env = "FUNDING_UTXO", help = "the funding utxo as <txid>:<vout>")]
    pub(crate) funding: UtxoRef,

    #[arg(
        long,
        env = "SIGNER_PUBKEY",
        help = "the signer's public key in hex, compressed or x-only (defaults to the local key)"
    )]
    pub(crate) signer_pubkey: Option<String>,

    #[arg(long, help = "sign and print the package without broadcasting it")]
    pub(crate) dry_run: bool,
}
