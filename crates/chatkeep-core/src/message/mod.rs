//! Message domain module.
//!
//! # Module Structure
//!
//! - `fields`: Field names chatkeep reads or writes on a message record
//! - `live`: Host-side open message record (`LiveMessage`, `LiveValue`)
//! - `stored`: Plain-data record owned by the history store (`StoredMessage`)
//! - `sanitize`: Conversion from live to stored records

pub mod fields;
mod live;
mod sanitize;
mod stored;

pub use live::{Callback, LiveMessage, LiveValue, OpaqueHandle};
pub use sanitize::{Sanitized, sanitize};
pub use stored::StoredMessage;
