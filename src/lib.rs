//! FileChain - a file-notarization ledger with detached block signatures
//!
//! # Architecture
//!
//! ## Ledger
//! - [`blockchain`] - Block records, canonical messages, chain linkage
//! - [`signatures`] - Signature verification and the signature registry
//! - [`persistence`] - JSON-file, SQLite and in-memory storage
//!
//! ## Signing Client
//! - [`client`] - HTTP client for the ledger server
//! - [`payload`] - The `/sign_block` payload
//! - [`signer`] - The end-to-end signing pipeline
//!
//! ## Cryptography
//! - [`crypto`] - SHA-256 file digests and RSA PKCS#1 v1.5 signatures
//!
//! ## Integration
//! - [`api`] - REST API served by `filechain-server`
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Ledger
// ============================================================================
pub mod blockchain;
pub mod persistence;
pub mod signatures;

// ============================================================================
// Signing Client
// ============================================================================
pub mod client;
pub mod payload;
pub mod signer;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
