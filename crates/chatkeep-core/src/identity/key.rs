//! Stable conversation key.

use crate::contact::Contact;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between display name and alias in the rendered key.
pub const KEY_SEPARATOR: &str = "_&&_";

/// Cross-session identity of a conversation.
///
/// Derived only from `(display_name, alias)`, never from the ephemeral id.
/// Two distinct contacts sharing both values collide onto the same key and
/// therefore share one history.
///
/// The rendered form (`Display`) is for logs only: it is ambiguous when a
/// name contains [`KEY_SEPARATOR`]. Equality is always on both fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StableConversationKey {
    display_name: String,
    alias: String,
}

impl StableConversationKey {
    pub fn new(display_name: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            alias: alias.into(),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Returns true if the contact derives to this key.
    pub fn matches(&self, contact: &Contact) -> bool {
        self.display_name == contact.display_name && self.alias == contact.alias
    }
}

impl From<&Contact> for StableConversationKey {
    fn from(contact: &Contact) -> Self {
        Self::new(contact.display_name.clone(), contact.alias.clone())
    }
}

impl fmt::Display for StableConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.display_name, KEY_SEPARATOR, self.alias)
    }
}
