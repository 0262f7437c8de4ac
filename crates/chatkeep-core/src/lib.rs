//! Domain layer of chatkeep: identities, message records and the
//! persistence interfaces the history subsystem is written against.

pub mod config;
pub mod contact;
pub mod error;
pub mod history;
pub mod identity;
pub mod message;

// Re-export common error type
pub use error::{ChatkeepError, Result};
