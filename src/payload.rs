//! The signature payload posted to `/sign_block`.

use crate::crypto::encode_signature;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignaturePayload {
    pub block_index: u64,
    pub signer_id: String,
    /// Base64 of the raw signature bytes.
    pub signature: String,
    /// Public key PEM, embedded verbatim.
    pub public_key: String,
}

impl SignaturePayload {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

pub fn build_payload(
    block_index: u64,
    signer_id: &str,
    signature: &[u8],
    public_key_pem: impl Into<String>,
) -> SignaturePayload {
    SignaturePayload {
        block_index,
        signer_id: signer_id.to_string(),
        signature: encode_signature(signature),
        public_key: public_key_pem.into(),
    }
}
