//! Contact domain module.
//!
//! The host owns contact records; chatkeep only reads them through an
//! injected [`SessionContext`] that is rebuilt once per login.
//!
//! # Module Structure
//!
//! - `model`: The host's contact record (`Contact`)
//! - `session`: The per-login contact directory (`SessionContext`)

mod model;
mod session;

pub use model::Contact;
pub use session::SessionContext;
