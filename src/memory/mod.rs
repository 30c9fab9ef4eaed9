//! Conversation memory
//!
//! Each question gets a fresh chat history; tool calls and their results are
//! appended as the model works through them.

pub mod store;

pub use store::ChatHistory;
