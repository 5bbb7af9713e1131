//! The signing pipeline: hash the file, fetch the block, sign its canonical
//! message, and assemble the payload for `/sign_block`.

use crate::blockchain::Block;
use crate::client::LedgerClient;
use crate::config::SignerConfig;
use crate::crypto::{hash_file, parse_public_key_pem, read_text_file, verify_signature, KeyPair};
use crate::error::{LedgerError, Result};
use crate::payload::{build_payload, SignaturePayload};
use rsa::RsaPublicKey;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug)]
pub struct SignOutcome {
    pub file_hash: String,
    pub block: Block,
    pub payload: SignaturePayload,
    /// Server response, present only when submission was enabled.
    pub submission: Option<Value>,
}

/// Signs the canonical message of `block`.
pub fn sign_block(keypair: &KeyPair, block: &Block) -> Vec<u8> {
    keypair.sign(&block.canonical_message())
}

/// Reads the public key file verbatim, along with the parsed key.
pub fn load_public_key_pem(path: &Path) -> Result<(String, RsaPublicKey)> {
    let pem = read_text_file(path)?;
    let public_key = parse_public_key_pem(&pem).map_err(|reason| LedgerError::KeyParse {
        path: path.to_path_buf(),
        reason,
    })?;
    Ok((pem, public_key))
}

fn mismatch(strict: bool, message: String) -> Result<()> {
    if strict {
        Err(LedgerError::ValidationError(message))
    } else {
        warn!("{}", message);
        Ok(())
    }
}

pub async fn run(config: &SignerConfig) -> Result<SignOutcome> {
    config.validate()?;

    let file_hash = hash_file(&config.file_path)?;
    info!(file = %config.file_path.display(), %file_hash, "Hashed file");

    let client = LedgerClient::new(&config.server_url, config.timeout())?;
    let block = client.fetch_block(config.block_index).await?;
    if block.index != config.block_index {
        return Err(LedgerError::MalformedResponse {
            url: client.block_url(config.block_index),
            field: format!(
                "data.block.index (asked for {}, got {})",
                config.block_index, block.index
            ),
        });
    }
    info!(block_index = block.index, user_id = %block.user_id, "Fetched block");

    if block.file_hash != file_hash {
        mismatch(
            config.strict,
            format!(
                "File hash {} does not match block {} file_hash {}",
                file_hash, block.index, block.file_hash
            ),
        )?;
    }

    let keypair = KeyPair::load_private_pem(&config.private_key_path)?;
    let message = block.canonical_message();
    let signature = keypair.sign(&message);

    let (public_key_pem, public_key) = load_public_key_pem(&config.public_key_path)?;
    if verify_signature(&public_key, &message, &signature).is_err() {
        mismatch(
            config.strict,
            format!(
                "Public key {} does not verify signatures made with {}",
                config.public_key_path.display(),
                config.private_key_path.display()
            ),
        )?;
    }

    let payload = build_payload(config.block_index, &config.signer_id, &signature, public_key_pem);
    info!(block_index = payload.block_index, signer_id = %payload.signer_id, "Built signature payload");

    let submission = if config.submit {
        let response = client.submit_signature(&payload).await?;
        info!(url = %client.sign_block_url(), "Signature submitted");
        Some(response)
    } else {
        None
    };

    Ok(SignOutcome {
        file_hash,
        block,
        payload,
        submission,
    })
}
