//! Contact record as delivered by the host.

use serde::{Deserialize, Serialize};

/// A conversation partner as known to the host in the current session.
///
/// `ephemeral_id` is only valid until the next login. `display_name` and
/// `alias` are assumed to stay the same for a given human contact across
/// sessions, which is what makes history keyable at all.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contact {
    /// Session-scoped identifier assigned by the host.
    pub ephemeral_id: String,
    /// Name the contact chose for themselves.
    pub display_name: String,
    /// Local alias given to the contact; empty when unset.
    #[serde(default)]
    pub alias: String,
}

impl Contact {
    /// Creates a new contact record.
    pub fn new(
        ephemeral_id: impl Into<String>,
        display_name: impl Into<String>,
        alias: impl Into<String>,
    ) -> Self {
        Self {
            ephemeral_id: ephemeral_id.into(),
            display_name: display_name.into(),
            alias: alias.into(),
        }
    }
}
