//! REST API for the FileChain ledger
//!
//! Every response uses the same envelope:
//! `{"status": "success" | "error", "message": "...", "data": ... | null}`.

use axum::{
    extract::{Path, Request, State},
    http::{self, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::blockchain::Blockchain;
use crate::crypto::hash_file;
use crate::error::{LedgerError, Result};
use crate::persistence::Persistence;
use crate::signatures::{check_block_signature, verify_block_signature, SignatureRecord};

/// Shared server state
#[derive(Clone)]
pub struct Node {
    pub blockchain: Arc<RwLock<Blockchain>>,
    pub persistence: Arc<dyn Persistence>,
    started: Instant,
}

impl Node {
    pub fn new(blockchain: Blockchain, persistence: Arc<dyn Persistence>) -> Self {
        Self {
            blockchain: Arc::new(RwLock::new(blockchain)),
            persistence,
            started: Instant::now(),
        }
    }
}

// ============================================================================
// Envelope & Error Handling
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    pub data: Option<T>,
}

fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    let body = ApiResponse {
        status: "success".to_string(),
        message: message.to_string(),
        data: Some(data),
    };
    (status, Json(body)).into_response()
}

#[derive(Debug)]
pub enum ApiError {
    /// 400, bad or missing input
    Validation(String),
    NotFound(String),
    /// 400, a request that is well-formed but cannot be honored
    Error(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Error(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body: ApiResponse<()> = ApiResponse {
            status: "error".to_string(),
            message,
            data: None,
        };
        (status, Json(body)).into_response()
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::BlockNotFound(_) => ApiError::NotFound("Block not found".to_string()),
            LedgerError::FileAccess { .. } => ApiError::Validation("File does not exist".to_string()),
            LedgerError::ValidationError(msg) => ApiError::Validation(msg),
            LedgerError::InvalidSignature => ApiError::Validation("Invalid signature".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct AddBlockRequest {
    pub file_path: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SignBlockRequest {
    pub block_index: Option<u64>,
    pub signer_id: Option<String>,
    pub signature: Option<String>,
    pub public_key: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// Middleware
// ============================================================================

async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;

    tracing::info!(
        method = %method,
        path = %path,
        status = %response.status().as_u16(),
        duration_ms = %start.elapsed().as_millis(),
        "api.request"
    );

    response
}

// ============================================================================
// API Server
// ============================================================================

pub fn build_api_router(node: Arc<Node>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods(vec![
            http::Method::GET,
            http::Method::POST,
            http::Method::OPTIONS,
        ])
        .allow_headers(vec![http::header::CONTENT_TYPE]);

    Router::new()
        .route("/add_block", post(add_block))
        .route("/chain", get(get_chain))
        .route("/validate_chain", get(validate_chain))
        .route("/block/:index", get(get_block))
        .route("/sign_block", post(sign_block))
        .route("/check_signature/:index", get(check_signature))
        .route("/health", get(health_check))
        .layer(middleware::from_fn(logging_middleware))
        .with_state(node)
        .layer(cors)
}

pub async fn run_api_server(node: Arc<Node>, addr: SocketAddr) -> Result<()> {
    let app = build_api_router(node);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        LedgerError::IoError(format!("Cannot bind {}: {}", addr, e))
    })?;

    tracing::info!("Ledger API listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

async fn add_block(
    State(node): State<Arc<Node>>,
    payload: Option<Json<AddBlockRequest>>,
) -> std::result::Result<Response, ApiError> {
    let req = payload.map(|Json(r)| r).unwrap_or_default();
    let (Some(file_path), Some(user_id)) = (non_empty(req.file_path), non_empty(req.user_id)) else {
        return Err(ApiError::Validation(
            "file_path and user_id are required".to_string(),
        ));
    };

    let path = PathBuf::from(&file_path);
    if !path.is_file() {
        return Err(ApiError::Validation("File does not exist".to_string()));
    }

    let file_hash = tokio::task::spawn_blocking(move || hash_file(&path))
        .await
        .map_err(|e| ApiError::Internal(format!("Hashing task failed: {}", e)))??;

    let mut chain = node.blockchain.write().await;
    let mut next = chain.clone();
    let block = next.append(file_hash, user_id);
    node.persistence.save_chain(next.blocks())?;
    *chain = next;
    let chain_valid = chain.is_valid();

    tracing::info!(index = block.index, user_id = %block.user_id, "Block added");

    Ok(success(
        StatusCode::CREATED,
        "Block added successfully",
        json!({ "block": block, "chain_valid": chain_valid }),
    ))
}

async fn get_chain(State(node): State<Arc<Node>>) -> Response {
    let chain = node.blockchain.read().await;
    success(
        StatusCode::OK,
        "Blockchain retrieved successfully",
        json!({ "chain": chain.blocks() }),
    )
}

async fn validate_chain(State(node): State<Arc<Node>>) -> std::result::Result<Response, ApiError> {
    let chain = node.blockchain.read().await;
    if let Err(e) = chain.validate() {
        tracing::warn!("Chain validation failed: {}", e);
        return Err(ApiError::Error("Blockchain is not valid".to_string()));
    }
    Ok(success(
        StatusCode::OK,
        "Blockchain validation completed",
        json!({ "chain_valid": true }),
    ))
}

async fn get_block(
    State(node): State<Arc<Node>>,
    Path(index): Path<u64>,
) -> std::result::Result<Response, ApiError> {
    let chain = node.blockchain.read().await;
    let block = chain.block(index)?;
    Ok(success(
        StatusCode::OK,
        "Block retrieved successfully",
        json!({ "block": block }),
    ))
}

async fn sign_block(
    State(node): State<Arc<Node>>,
    payload: Option<Json<SignBlockRequest>>,
) -> std::result::Result<Response, ApiError> {
    let req = payload.map(|Json(r)| r).unwrap_or_default();
    let (Some(block_index), Some(signer_id), Some(signature), Some(public_key)) = (
        req.block_index,
        non_empty(req.signer_id),
        non_empty(req.signature),
        non_empty(req.public_key),
    ) else {
        return Err(ApiError::Validation(
            "block_index, signer_id, signature, and public_key are required".to_string(),
        ));
    };

    let block = {
        let chain = node.blockchain.read().await;
        chain.block(block_index)?.clone()
    };

    match verify_block_signature(&block, &signature, &public_key) {
        Ok(true) => {}
        Ok(false) => return Err(ApiError::Validation("Invalid signature".to_string())),
        Err(e) => return Err(ApiError::Validation(format!("Invalid signature: {}", e))),
    }

    let record = SignatureRecord::new(block_index, &signer_id, &signature, &public_key);
    node.persistence.append_signature(&record)?;

    tracing::info!(block_index, signer_id = %signer_id, "Signature saved");

    Ok(success(
        StatusCode::CREATED,
        "Signature saved successfully",
        json!({ "signature_saved": true }),
    ))
}

async fn check_signature(
    State(node): State<Arc<Node>>,
    Path(index): Path<u64>,
) -> std::result::Result<Response, ApiError> {
    let block = {
        let chain = node.blockchain.read().await;
        chain
            .block(index)
            .map_err(|_| ApiError::Error("Block not found".to_string()))?
            .clone()
    };

    let records = node.persistence.load_signatures()?;
    let result = check_block_signature(&block, &records);
    Ok(success(StatusCode::OK, "Signature check completed", result))
}

async fn health_check(State(node): State<Arc<Node>>) -> Response {
    let blocks = node.blockchain.read().await.len();
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "blocks": blocks,
            "uptime_seconds": node.started.elapsed().as_secs(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        })),
    )
        .into_response()
}
