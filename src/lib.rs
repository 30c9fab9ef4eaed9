//! HR Assistant
//!
//! An HR helper that lets a language model decide how to answer:
//! - Leave balances come from a relational store (Postgres)
//! - Policy text comes from a vector store (Qdrant)
//! - Both are exposed as annotated kernel functions on an HR plugin
//! - The model reads the function descriptions and picks which to call
//!
//! LOOP:
//! QUESTION → MODEL → (CALL FUNCTIONS → MODEL)* → ANSWER
//!
//! ```
//! use hr_assistant::leaves::InMemoryLeaveStore;
//! use hr_assistant::plugin::HrPlugin;
//! use hr_assistant::policy::{seed_default_policies, HashingEmbedder, InMemoryPolicyStore};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let policies = Arc::new(InMemoryPolicyStore::new(Arc::new(HashingEmbedder::default())));
//! seed_default_policies(policies.as_ref()).await.unwrap();
//!
//! let plugin = HrPlugin::new(Arc::new(InMemoryLeaveStore::with_sample_data()), policies);
//! assert_eq!(
//!     plugin.get_leave_balance("Bob").await,
//!     "Bob has 8 days of annual leave remaining."
//! );
//! # });
//! ```

pub mod agent;
pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod interactive;
pub mod leaves;
pub mod llm;
pub mod logging;
pub mod memory;
pub mod models;
pub mod plugin;
pub mod policy;
pub mod routing;
pub mod tools;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::Result;

// Re-export common types
pub use agent::HrAssistant;
pub use config::Settings;
pub use models::*;
pub use plugin::HrPlugin;
