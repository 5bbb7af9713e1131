//! Storage backends for the ledger chain and the signature registry

use crate::blockchain::{Block, Blockchain, Timestamp};
use crate::config::{StorageBackend, StorageConfig};
use crate::error::{LedgerError, Result};
use crate::signatures::SignatureRecord;
use rusqlite::{params, Connection};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

/// Abstraction for persistence backends. `save_chain` replaces the whole
/// stored chain; signatures are append-only.
pub trait Persistence: Send + Sync {
    /// `Ok(None)` when nothing has been stored yet.
    fn load_chain(&self) -> Result<Option<Vec<Block>>>;
    fn save_chain(&self, blocks: &[Block]) -> Result<()>;
    fn load_signatures(&self) -> Result<Vec<SignatureRecord>>;
    fn append_signature(&self, record: &SignatureRecord) -> Result<()>;
}

pub fn open_storage(config: &StorageConfig) -> Result<Box<dyn Persistence>> {
    let persistence: Box<dyn Persistence> = match config.backend {
        StorageBackend::Json => Box::new(JsonFilePersistence::new(
            &config.chain_path,
            &config.signatures_path,
        )),
        StorageBackend::Sqlite => Box::new(Database::open(&config.database_path)?),
        StorageBackend::Memory => Box::new(InMemoryPersistence::new()),
    };
    Ok(persistence)
}

/// Loads the stored chain, or creates and stores a genesis-only chain when
/// nothing usable is stored.
pub fn load_or_create_chain(persistence: &dyn Persistence) -> Result<Blockchain> {
    match persistence.load_chain() {
        Ok(Some(blocks)) if !blocks.is_empty() => return Blockchain::from_blocks(blocks),
        Ok(_) => info!("No stored chain, creating genesis block"),
        Err(e) => warn!("Error loading blockchain: {}. Creating genesis block.", e),
    }
    let chain = Blockchain::new();
    persistence.save_chain(chain.blocks())?;
    Ok(chain)
}

// ============================================================================
// JSON files
// ============================================================================

/// Pretty-printed JSON arrays in two files.
pub struct JsonFilePersistence {
    chain_path: PathBuf,
    signatures_path: PathBuf,
    // serializes read-modify-write of the signatures file
    signatures_lock: Mutex<()>,
}

impl JsonFilePersistence {
    pub fn new(chain_path: &Path, signatures_path: &Path) -> Self {
        JsonFilePersistence {
            chain_path: chain_path.to_path_buf(),
            signatures_path: signatures_path.to_path_buf(),
            signatures_lock: Mutex::new(()),
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .map_err(|e| LedgerError::StorageError(format!("Cannot write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, path)
            .map_err(|e| LedgerError::StorageError(format!("Cannot replace {}: {}", path.display(), e)))
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(LedgerError::StorageError(format!(
                    "Cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&contents).map(Some).map_err(|e| {
            LedgerError::StorageError(format!("Corrupt JSON in {}: {}", path.display(), e))
        })
    }
}

impl Persistence for JsonFilePersistence {
    fn load_chain(&self) -> Result<Option<Vec<Block>>> {
        Self::read_json(&self.chain_path)
    }

    fn save_chain(&self, blocks: &[Block]) -> Result<()> {
        Self::write_json(&self.chain_path, blocks)
    }

    fn load_signatures(&self) -> Result<Vec<SignatureRecord>> {
        Ok(Self::read_json::<Vec<SignatureRecord>>(&self.signatures_path)?.unwrap_or_default())
    }

    fn append_signature(&self, record: &SignatureRecord) -> Result<()> {
        let _guard = self
            .signatures_lock
            .lock()
            .map_err(|_| LedgerError::StorageError("Mutex poisoned".to_string()))?;
        let mut signatures: Vec<SignatureRecord> =
            Self::read_json(&self.signatures_path)?.unwrap_or_default();
        signatures.push(record.clone());
        Self::write_json(&self.signatures_path, &signatures)
    }
}

// ============================================================================
// SQLite
// ============================================================================

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|e| {
            LedgerError::StorageError(format!("Failed to open database {}: {}", path.display(), e))
        })?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LedgerError::StorageError(format!("Failed to open database: {}", e)))?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS blocks (
                idx INTEGER PRIMARY KEY,
                previous_hash TEXT NOT NULL,
                file_hash TEXT NOT NULL,
                user_id TEXT NOT NULL,
                timestamp REAL NOT NULL,
                hash TEXT NOT NULL
            )",
            [],
        )
        .map_err(|e| LedgerError::StorageError(format!("Failed to create blocks table: {}", e)))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS signatures (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                block_index INTEGER NOT NULL,
                signer_id TEXT NOT NULL,
                signature TEXT NOT NULL,
                public_key TEXT NOT NULL,
                signed_at REAL NOT NULL
            )",
            [],
        )
        .map_err(|e| {
            LedgerError::StorageError(format!("Failed to create signatures table: {}", e))
        })?;

        Ok(Database {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| LedgerError::StorageError("Mutex poisoned".to_string()))
    }
}

impl Persistence for Database {
    fn load_chain(&self) -> Result<Option<Vec<Block>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT idx, previous_hash, file_hash, user_id, timestamp, hash
             FROM blocks ORDER BY idx ASC",
        )?;
        let blocks = stmt
            .query_map([], |row| {
                Ok(Block {
                    index: row.get::<_, i64>(0)? as u64,
                    previous_hash: row.get(1)?,
                    file_hash: row.get(2)?,
                    user_id: row.get(3)?,
                    timestamp: Timestamp::from_secs_f64(row.get(4)?),
                    hash: row.get(5)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<Block>>>()?;

        if blocks.is_empty() {
            Ok(None)
        } else {
            Ok(Some(blocks))
        }
    }

    fn save_chain(&self, blocks: &[Block]) -> Result<()> {
        // One transaction so a crash never leaves a half-written chain
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM blocks", [])?;
        for block in blocks {
            tx.execute(
                "INSERT INTO blocks (idx, previous_hash, file_hash, user_id, timestamp, hash)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    block.index as i64,
                    block.previous_hash,
                    block.file_hash,
                    block.user_id,
                    block.timestamp.as_secs_f64(),
                    block.hash,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_signatures(&self) -> Result<Vec<SignatureRecord>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT block_index, signer_id, signature, public_key, signed_at
             FROM signatures ORDER BY id ASC",
        )?;
        let records = stmt
            .query_map([], |row| {
                Ok(SignatureRecord {
                    block_index: row.get::<_, i64>(0)? as u64,
                    signer_id: row.get(1)?,
                    signature: row.get(2)?,
                    public_key: row.get(3)?,
                    signed_at: Timestamp::from_secs_f64(row.get(4)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<SignatureRecord>>>()?;
        Ok(records)
    }

    fn append_signature(&self, record: &SignatureRecord) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO signatures (block_index, signer_id, signature, public_key, signed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.block_index as i64,
                record.signer_id,
                record.signature,
                record.public_key,
                record.signed_at.as_secs_f64(),
            ],
        )?;
        Ok(())
    }
}

// ============================================================================
// In-memory
// ============================================================================

#[derive(Default)]
pub struct InMemoryPersistence {
    blocks: Mutex<Option<Vec<Block>>>,
    signatures: Mutex<Vec<SignatureRecord>>,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persistence for InMemoryPersistence {
    fn load_chain(&self) -> Result<Option<Vec<Block>>> {
        let blocks = self
            .blocks
            .lock()
            .map_err(|_| LedgerError::StorageError("Mutex poisoned".to_string()))?;
        Ok(blocks.clone())
    }

    fn save_chain(&self, blocks: &[Block]) -> Result<()> {
        let mut stored = self
            .blocks
            .lock()
            .map_err(|_| LedgerError::StorageError("Mutex poisoned".to_string()))?;
        *stored = Some(blocks.to_vec());
        Ok(())
    }

    fn load_signatures(&self) -> Result<Vec<SignatureRecord>> {
        let signatures = self
            .signatures
            .lock()
            .map_err(|_| LedgerError::StorageError("Mutex poisoned".to_string()))?;
        Ok(signatures.clone())
    }

    fn append_signature(&self, record: &SignatureRecord) -> Result<()> {
        let mut signatures = self
            .signatures
            .lock()
            .map_err(|_| LedgerError::StorageError("Mutex poisoned".to_string()))?;
        signatures.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_chain() -> Blockchain {
        let mut chain = Blockchain::new();
        chain.append("aa11", "alice");
        chain.append("bb22", "bob");
        chain
    }

    fn sample_record() -> SignatureRecord {
        SignatureRecord::new(1, "alice", "c2ln", "-----BEGIN PUBLIC KEY-----\n")
    }

    fn exercise(persistence: &dyn Persistence) {
        assert!(persistence.load_chain().unwrap().is_none());
        assert!(persistence.load_signatures().unwrap().is_empty());

        let chain = sample_chain();
        persistence.save_chain(chain.blocks()).unwrap();
        let loaded = persistence.load_chain().unwrap().unwrap();
        assert_eq!(loaded, chain.blocks());
        assert!(Blockchain::from_blocks(loaded).unwrap().is_valid());

        persistence.append_signature(&sample_record()).unwrap();
        let mut second = sample_record();
        second.block_index = 2;
        persistence.append_signature(&second).unwrap();

        let records = persistence.load_signatures().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].block_index, 1);
        assert_eq!(records[1].block_index, 2);
    }

    #[test]
    fn test_json_backend() {
        let dir = TempDir::new().unwrap();
        let persistence = JsonFilePersistence::new(
            &dir.path().join("blockchain.json"),
            &dir.path().join("signatures.json"),
        );
        exercise(&persistence);

        // Written as a plain JSON array of blocks
        let raw = fs::read_to_string(dir.path().join("blockchain.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 3);
        assert_eq!(value[0]["user_id"], "system");
    }

    #[test]
    fn test_sqlite_backend() {
        exercise(&Database::open_in_memory().unwrap());
    }

    #[test]
    fn test_sqlite_file_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ledger.db");
        let chain = sample_chain();
        {
            let db = Database::open(&path).unwrap();
            db.save_chain(chain.blocks()).unwrap();
        }
        let db = Database::open(&path).unwrap();
        assert_eq!(db.load_chain().unwrap().unwrap(), chain.blocks());
    }

    #[test]
    fn test_memory_backend() {
        exercise(&InMemoryPersistence::new());
    }

    #[test]
    fn test_corrupt_chain_file_creates_genesis() {
        let dir = TempDir::new().unwrap();
        let chain_path = dir.path().join("blockchain.json");
        fs::write(&chain_path, "{ not json").unwrap();
        let persistence = JsonFilePersistence::new(&chain_path, &dir.path().join("signatures.json"));

        let chain = load_or_create_chain(&persistence).unwrap();
        assert_eq!(chain.len(), 1);
        // The fresh genesis chain was written back
        assert_eq!(persistence.load_chain().unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_empty_chain_file_creates_genesis() {
        let dir = TempDir::new().unwrap();
        let chain_path = dir.path().join("blockchain.json");
        fs::write(&chain_path, "[]").unwrap();
        let persistence = JsonFilePersistence::new(&chain_path, &dir.path().join("signatures.json"));

        assert_eq!(load_or_create_chain(&persistence).unwrap().len(), 1);
    }

    #[test]
    fn test_existing_chain_is_kept() {
        let persistence = InMemoryPersistence::new();
        let chain = sample_chain();
        persistence.save_chain(chain.blocks()).unwrap();

        let loaded = load_or_create_chain(&persistence).unwrap();
        assert_eq!(loaded.blocks(), chain.blocks());
    }
}
