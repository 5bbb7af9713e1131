use crate::blockchain::block::Block;
use crate::blockchain::validation::validate_chain;
use crate::crypto::hash_file;
use crate::error::{LedgerError, Result};
use std::path::Path;

/// An append-only list of blocks. Always holds at least the genesis block.
#[derive(Debug, Clone)]
pub struct Blockchain {
    blocks: Vec<Block>,
}

impl Blockchain {
    /// A fresh chain containing only a genesis block.
    pub fn new() -> Self {
        Blockchain {
            blocks: vec![Block::genesis()],
        }
    }

    /// Wraps previously persisted blocks. Linkage is not checked here; use
    /// [`Blockchain::is_valid`] for that.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self> {
        if blocks.is_empty() {
            return Err(LedgerError::ValidationError(
                "A chain needs at least a genesis block".to_string(),
            ));
        }
        Ok(Blockchain { blocks })
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn tip(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }

    pub fn block(&self, index: u64) -> Result<&Block> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.blocks.get(i))
            .ok_or(LedgerError::BlockNotFound(index))
    }

    /// Hashes `file_path` and appends a block for it owned by `user_id`.
    pub fn add_block(&mut self, file_path: &Path, user_id: &str) -> Result<Block> {
        let file_hash = hash_file(file_path)?;
        Ok(self.append(file_hash, user_id))
    }

    /// Appends a block for an already computed file hash.
    pub fn append(&mut self, file_hash: impl Into<String>, user_id: impl Into<String>) -> Block {
        let previous = self.tip();
        let block = Block::new(previous.index + 1, previous.hash.clone(), file_hash, user_id);
        self.blocks.push(block.clone());
        block
    }

    pub fn validate(&self) -> Result<()> {
        validate_chain(&self.blocks)
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_new_chain_has_genesis() {
        let chain = Blockchain::new();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain.tip().user_id, "system");
        assert!(chain.is_valid());
    }

    #[test]
    fn test_add_block_links_to_tip() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello").unwrap();

        let mut chain = Blockchain::new();
        let genesis_hash = chain.tip().hash.clone();
        let block = chain.add_block(file.path(), "user123").unwrap();

        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(
            block.file_hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert_eq!(chain.block(1).unwrap(), &block);
        assert!(chain.is_valid());
    }

    #[test]
    fn test_add_block_missing_file_leaves_chain_untouched() {
        let mut chain = Blockchain::new();
        let result = chain.add_block(Path::new("/no/such/file"), "user123");
        assert!(matches!(result, Err(LedgerError::FileAccess { .. })));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn test_block_not_found() {
        let chain = Blockchain::new();
        assert!(matches!(chain.block(5), Err(LedgerError::BlockNotFound(5))));
    }

    #[test]
    fn test_tampering_invalidates_chain() {
        let mut chain = Blockchain::new();
        chain.append("aa", "alice");
        chain.append("bb", "bob");
        assert!(chain.is_valid());

        let mut blocks = chain.blocks().to_vec();
        blocks[1].file_hash = "cc".to_string();
        let tampered = Blockchain::from_blocks(blocks).unwrap();
        assert!(!tampered.is_valid());
    }

    #[test]
    fn test_from_blocks_rejects_empty() {
        assert!(Blockchain::from_blocks(Vec::new()).is_err());
    }
}
