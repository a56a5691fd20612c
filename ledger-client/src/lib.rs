//! # ledger-client
//!
//! Offline-capable REST client for the ledgerlink bookkeeping backend.
//!
//! This is the library applications use to talk to the server.
//!
//! ## Features
//!
//! - **Token lifecycle**: bearer credentials attached to every request,
//!   with a single-flight refresh shared by all concurrent 401 observers
//! - **Transport abstraction**: pluggable HTTP layer (reqwest, mock)
//! - **Upload pipeline**: multipart uploads with progress reporting and
//!   bounded linear backoff
//! - **Offline sync**: durable mutation queue replayed on reconnect, with
//!   wholesale cache snapshots for offline reads
//!
//! ## Example
//!
//! ```ignore
//! use ledger_client::{ApiClient, ClientConfig, MemoryStore, TokenStore};
//! use ledger_client::transport::ReqwestTransport;
//! use std::sync::Arc;
//!
//! let config = ClientConfig::resolve()?;
//! let transport = ReqwestTransport::new()?;
//! let tokens = TokenStore::new(Arc::new(MemoryStore::new()));
//! let client = ApiClient::new(config, transport, tokens);
//!
//! client.login("pat@example.com", "hunter2").await?;
//! let txs = client.list_transactions().await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod store;
pub mod sync;
pub mod token;
pub mod transport;
mod upload;

pub use client::ApiClient;
pub use config::{BuildMode, ClientConfig, ConfigFile};
pub use endpoints::{NewAlert, NewCategory, NewReminder, NewTransaction, ReceiptResponse};
pub use store::{FileStore, MemoryStore, SecretStore, StoreError};
pub use sync::{SyncEvent, SyncOptions, SyncReport, SyncService};
pub use token::TokenStore;
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, Method, MockTransport, MultipartForm,
    MultipartPart, ProgressCallback, ReqwestTransport, TransportError,
};
