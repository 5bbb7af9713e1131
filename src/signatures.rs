//! Server-side signature verification and the signature registry records.

use crate::blockchain::{Block, Timestamp};
use crate::crypto::{decode_signature, parse_public_key_pem, verify_signature};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A stored, already verified, signature over one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub block_index: u64,
    pub signer_id: String,
    pub signature: String,
    pub public_key: String,
    pub signed_at: Timestamp,
}

impl SignatureRecord {
    pub fn new(block_index: u64, signer_id: &str, signature: &str, public_key: &str) -> Self {
        SignatureRecord {
            block_index,
            signer_id: signer_id.to_string(),
            signature: signature.to_string(),
            public_key: public_key.to_string(),
            signed_at: Timestamp::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureCheck {
    pub signed: bool,
    pub valid: bool,
    pub signer_id: Option<String>,
}

impl SignatureCheck {
    pub fn unsigned() -> Self {
        SignatureCheck {
            signed: false,
            valid: false,
            signer_id: None,
        }
    }
}

/// Verifies a base64 signature over the block's canonical message.
///
/// Returns `Ok(false)` for a well-formed signature that does not verify; an
/// unparseable key or undecodable signature is an error.
pub fn verify_block_signature(block: &Block, signature_b64: &str, public_key_pem: &str) -> Result<bool> {
    let public_key = parse_public_key_pem(public_key_pem)
        .map_err(|e| LedgerError::CryptoError(format!("Invalid public key: {}", e)))?;
    let signature = decode_signature(signature_b64)?;
    match verify_signature(&public_key, &block.canonical_message(), &signature) {
        Ok(()) => Ok(true),
        Err(LedgerError::InvalidSignature) => Ok(false),
        Err(e) => Err(e),
    }
}

/// Looks up the first record for `block` and re-verifies it.
pub fn check_block_signature(block: &Block, records: &[SignatureRecord]) -> SignatureCheck {
    let Some(record) = records.iter().find(|r| r.block_index == block.index) else {
        return SignatureCheck::unsigned();
    };

    let valid = match verify_block_signature(block, &record.signature, &record.public_key) {
        Ok(valid) => valid,
        Err(e) => {
            warn!(block_index = block.index, "Stored signature cannot be checked: {}", e);
            false
        }
    };

    SignatureCheck {
        signed: true,
        valid,
        signer_id: Some(record.signer_id.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{encode_signature, test_keypair};

    fn block() -> Block {
        Block::with_timestamp(1, "abc", "def", "user123", Timestamp::from_secs_f64(1700000000.1234567))
    }

    fn signed_record(block: &Block) -> SignatureRecord {
        let keypair = test_keypair();
        let signature = encode_signature(&keypair.sign(&block.canonical_message()));
        SignatureRecord::new(block.index, "user123", &signature, &keypair.public_key_pem().unwrap())
    }

    #[test]
    fn test_verify_block_signature() {
        let block = block();
        let record = signed_record(&block);
        assert!(verify_block_signature(&block, &record.signature, &record.public_key).unwrap());

        let mut other = block.clone();
        other.timestamp = Timestamp::from_secs_f64(1700000001.1234567);
        assert!(!verify_block_signature(&other, &record.signature, &record.public_key).unwrap());
    }

    #[test]
    fn test_bad_key_is_error() {
        let block = block();
        let record = signed_record(&block);
        assert!(verify_block_signature(&block, &record.signature, "not a key").is_err());
    }

    #[test]
    fn test_check_signed_and_unsigned() {
        let block = block();
        let record = signed_record(&block);

        let check = check_block_signature(&block, &[record]);
        assert_eq!(
            check,
            SignatureCheck {
                signed: true,
                valid: true,
                signer_id: Some("user123".to_string()),
            }
        );

        assert_eq!(check_block_signature(&block, &[]), SignatureCheck::unsigned());
    }

    #[test]
    fn test_check_uses_first_matching_record() {
        let block = block();
        let mut forged = signed_record(&block);
        forged.signer_id = "mallory".to_string();
        forged.signature = encode_signature(&[0u8; 128]);
        let genuine = signed_record(&block);

        let check = check_block_signature(&block, &[forged, genuine]);
        assert!(check.signed);
        assert!(!check.valid);
        assert_eq!(check.signer_id.as_deref(), Some("mallory"));
    }
}
