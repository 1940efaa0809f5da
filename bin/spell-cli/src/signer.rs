//! The signer selected by the configuration file.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use secp256k1::{Keypair, SECP256K1};
use spell_package_signer::{
    ExternalSigner, HttpSigner, KeypairSigner, SignRequest, SignerResponse, SignerResult,
};
use spell_package_tx_builder::SignerKey;
use tracing::info;

use crate::config::SignerConfig;

/// A local key or a remote signer.
#[derive(Debug, Clone)]
pub(crate) enum CliSigner {
    Keypair(KeypairSigner),
    Http(HttpSigner),
}

impl CliSigner {
    pub(crate) fn from_config(config: &SignerConfig) -> Result<Self> {
        match config {
            SignerConfig::Keypair { key_path } => {
                let keypair = load_keypair(key_path)?;
                info!(pubkey = %keypair.public_key(), "using local signing key");

                Ok(Self::Keypair(KeypairSigner::new(keypair)))
            }
            SignerConfig::Http { url } => {
                info!(%url, "using remote signer");

                Ok(Self::Http(HttpSigner::new(url.as_str())))
            }
        }
    }

    /// The signer's key, if it is known locally.
    pub(crate) fn public_key(&self) -> Option<SignerKey> {
        match self {
            Self::Keypair(signer) => Some(signer.public_key().into()),
            Self::Http(_) => None,
        }
    }
}

impl ExternalSigner for CliSigner {
    async fn sign(&self, request: SignRequest) -> SignerResult<SignerResponse> {
        match self {
            Self::Keypair(signer) => signer.sign(request).await,
            Self::Http(signer) => signer.sign(request).await,
        }
    }
}

/// Reads a hex-encoded secret key from `path`.
fn load_keypair(path: &Path) -> Result<Keypair> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read signing key {}", path.display()))?;
    let bytes = hex::decode(contents.trim()).context("decode signing key")?;

    Keypair::from_seckey_slice(SECP256K1, &bytes).context("invalid signing key")
}

/// Parses the `--signer-pubkey` argument.
pub(crate) fn parse_signer_key(hex: &str) -> Result<SignerKey> {
    let bytes = hex::decode(hex.trim()).context("decode signer public key")?;

    Ok(SignerKey::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use spell_package_test_utils::keypair;

    use super::*;

    #[test]
    fn loads_key_file() {
        let expected = keypair(0x11);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", hex::encode(expected.secret_bytes())).unwrap();

        let signer = CliSigner::from_config(&SignerConfig::Keypair {
            key_path: file.path().to_path_buf(),
        })
        .unwrap();

        assert_eq!(signer.public_key(), Some(expected.public_key().into()));
    }

    #[test]
    fn remote_signer_has_no_local_key() {
        let signer = CliSigner::from_config(&SignerConfig::Http {
            url: "http://localhost:8000/sign".into(),
        })
        .unwrap();

        assert!(signer.public_key().is_none());
    }

    #[test]
    fn parses_compressed_and_x_only_keys() {
        let kp = keypair(0x11);

        assert_eq!(
            parse_signer_key(&hex::encode(kp.public_key().serialize())).unwrap(),
            SignerKey::Full(kp.public_key())
        );
        assert_eq!(
            parse_signer_key(&hex::encode(kp.x_only_public_key().0.serialize())).unwrap(),
            SignerKey::XOnly(kp.x_only_public_key().0)
        );
        assert!(parse_signer_key("02ab").is_err());
    }
}
