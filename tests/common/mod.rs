//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, INFLUENCER_USER};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_session() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::authenticated_influencer(server.base_url.clone()).await;
//!
//!     let response = client.get_session().await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;
