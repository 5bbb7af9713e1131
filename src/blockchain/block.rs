use crate::crypto::sha256_hex;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GENESIS_PREVIOUS_HASH: &str = "0";
pub const GENESIS_FILE_HASH: &str = "0";
pub const GENESIS_USER_ID: &str = "system";

/// Seconds since the Unix epoch, carried as a JSON number.
///
/// The canonical rendering always has exactly seven fractional digits, a `.`
/// decimal point and no grouping, so `1700000000.1234567` renders as
/// `"1700000000.1234567"` and `12.5` as `"12.5000000"`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(f64);

impl Timestamp {
    pub const FRACTION_DIGITS: usize = 7;

    pub fn from_secs_f64(secs: f64) -> Self {
        Timestamp(secs)
    }

    pub fn now() -> Self {
        let now = chrono::Utc::now();
        Timestamp(now.timestamp_micros() as f64 / 1_000_000.0)
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0
    }

    pub fn canonical(&self) -> String {
        format!("{:.*}", Self::FRACTION_DIGITS, self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// A ledger record notarizing one file for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub previous_hash: String,
    pub file_hash: String,
    pub user_id: String,
    pub timestamp: Timestamp,
    /// Absent on records that only carry the signed fields.
    #[serde(default)]
    pub hash: String,
}

impl Block {
    /// Creates a block stamped with the current time.
    pub fn new(
        index: u64,
        previous_hash: impl Into<String>,
        file_hash: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self::with_timestamp(index, previous_hash, file_hash, user_id, Timestamp::now())
    }

    pub fn with_timestamp(
        index: u64,
        previous_hash: impl Into<String>,
        file_hash: impl Into<String>,
        user_id: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        let mut block = Block {
            index,
            previous_hash: previous_hash.into(),
            file_hash: file_hash.into(),
            user_id: user_id.into(),
            timestamp,
            hash: String::new(),
        };
        block.hash = block.calculate_hash();
        block
    }

    pub fn genesis() -> Self {
        Self::new(0, GENESIS_PREVIOUS_HASH, GENESIS_FILE_HASH, GENESIS_USER_ID)
    }

    /// Fixed-order concatenation of the signed fields, no separators:
    /// index, previous_hash, file_hash, user_id, timestamp.
    pub fn canonical_string(&self) -> String {
        format!(
            "{}{}{}{}{}",
            self.index,
            self.previous_hash,
            self.file_hash,
            self.user_id,
            self.timestamp.canonical()
        )
    }

    /// The exact bytes that get signed and hashed.
    pub fn canonical_message(&self) -> Vec<u8> {
        self.canonical_string().into_bytes()
    }

    pub fn calculate_hash(&self) -> String {
        sha256_hex(&self.canonical_message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_block() -> Block {
        Block::with_timestamp(
            1,
            "abc",
            "def",
            "user123",
            Timestamp::from_secs_f64(1700000000.1234567),
        )
    }

    #[test]
    fn test_canonical_message_exact() {
        let block = sample_block();
        let expected = ["1", "abc", "def", "user123", "1700000000.1234567"].concat();
        assert_eq!(block.canonical_string(), expected);
        assert_eq!(block.canonical_message(), expected.into_bytes());
    }

    #[test]
    fn test_timestamp_always_seven_digits() {
        assert_eq!(Timestamp::from_secs_f64(12.5).canonical(), "12.5000000");
        assert_eq!(Timestamp::from_secs_f64(1700000000.0).canonical(), "1700000000.0000000");
        assert_eq!(Timestamp::from_secs_f64(0.25).canonical(), "0.2500000");
        // No grouping separators for large values
        assert!(!Timestamp::from_secs_f64(9999999999.5).canonical().contains(','));
    }

    #[test]
    fn test_hash_matches_canonical_message() {
        let block = sample_block();
        assert_eq!(block.hash, sha256_hex(block.canonical_string().as_bytes()));
        assert_eq!(block.hash, block.calculate_hash());
    }

    #[test]
    fn test_genesis_fields() {
        let genesis = Block::genesis();
        assert_eq!(genesis.index, 0);
        assert_eq!(genesis.previous_hash, "0");
        assert_eq!(genesis.file_hash, "0");
        assert_eq!(genesis.user_id, "system");
        assert_eq!(genesis.hash.len(), 64);
    }

    #[test]
    fn test_deserialize_without_hash() {
        let json = r#"{"index":1,"previous_hash":"abc","file_hash":"def",
                       "user_id":"user123","timestamp":1700000000.1234567}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert!(block.hash.is_empty());
        assert_eq!(block.canonical_string(), "1abcdefuser1231700000000.1234567");
    }

    #[test]
    fn test_integer_timestamp_accepted() {
        let json = r#"{"index":2,"previous_hash":"p","file_hash":"f",
                       "user_id":"u","timestamp":1700000000,"hash":"h"}"#;
        let block: Block = serde_json::from_str(json).unwrap();
        assert_eq!(block.timestamp.canonical(), "1700000000.0000000");
    }

    #[test]
    fn test_timestamp_serializes_as_number() {
        let value = serde_json::to_value(sample_block()).unwrap();
        assert!(value["timestamp"].is_f64());
    }
}
