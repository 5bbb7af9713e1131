use crate::blockchain::block::Block;
use crate::error::{LedgerError, Result};

/// Checks that `current` links to `previous` and that its stored hash is the
/// hash of its own canonical message.
pub fn validate_link(previous: &Block, current: &Block) -> Result<()> {
    if current.previous_hash != previous.hash {
        return Err(LedgerError::ValidationError(format!(
            "Block {} does not link to block {}: previous_hash {} != {}",
            current.index, previous.index, current.previous_hash, previous.hash
        )));
    }
    let recomputed = current.calculate_hash();
    if current.hash != recomputed {
        return Err(LedgerError::ValidationError(format!(
            "Block {} hash mismatch: stored {}, computed {}",
            current.index, current.hash, recomputed
        )));
    }
    Ok(())
}

/// Validates every block after genesis against its predecessor.
pub fn validate_chain(blocks: &[Block]) -> Result<()> {
    for pair in blocks.windows(2) {
        validate_link(&pair[0], &pair[1])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::block::Timestamp;

    fn linked_pair() -> (Block, Block) {
        let genesis = Block::with_timestamp(0, "0", "0", "system", Timestamp::from_secs_f64(1.0));
        let next = Block::with_timestamp(
            1,
            genesis.hash.clone(),
            "feed",
            "alice",
            Timestamp::from_secs_f64(2.0),
        );
        (genesis, next)
    }

    #[test]
    fn test_valid_link() {
        let (genesis, next) = linked_pair();
        assert!(validate_link(&genesis, &next).is_ok());
        assert!(validate_chain(&[genesis, next]).is_ok());
    }

    #[test]
    fn test_broken_link() {
        let (genesis, mut next) = linked_pair();
        next.previous_hash = "deadbeef".to_string();
        let err = validate_link(&genesis, &next).unwrap_err();
        assert!(err.to_string().contains("does not link"));
    }

    #[test]
    fn test_tampered_field_detected() {
        let (genesis, mut next) = linked_pair();
        next.user_id = "mallory".to_string();
        let err = validate_chain(&[genesis, next]).unwrap_err();
        assert!(err.to_string().contains("hash mismatch"));
    }

    #[test]
    fn test_genesis_alone_is_valid() {
        assert!(validate_chain(&[Block::genesis()]).is_ok());
        assert!(validate_chain(&[]).is_ok());
    }
}
