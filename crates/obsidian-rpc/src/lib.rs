//! Obsidian RPC client library.
//!
//! Provides an async JSON-RPC 2.0 client for the Obsidian node, typed
//! wrappers for the balance and submission methods, and the `NodeApi`
//! trait the wallet is written against.
//!
//! # Example
//!
//! ```ignore
//! use obsidian_rpc::{NodeApi, NodeRpc};
//!
//! #[tokio::main]
//! async fn main() {
//!     let node = NodeRpc::new("localhost:8545").unwrap();
//!     let height = node.block_count().await.unwrap();
//!     println!("Height: {}", height);
//! }
//! ```

pub mod client;
pub mod error;
pub mod node;

pub use client::{normalize_endpoint, RpcClient, RpcConfig};
pub use error::RpcError;
pub use node::{BalanceInfo, NodeApi, NodeRpc};
