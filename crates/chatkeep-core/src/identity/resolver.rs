//! Forward and reverse identity resolution against the live directory.

use super::key::StableConversationKey;
use crate::contact::{Contact, SessionContext};

/// Resolves stable keys from contacts and back into the current session.
///
/// Nothing is cached: every reverse lookup scans the directory of the
/// session it was built from, so results always reflect the current login.
#[derive(Debug, Clone, Copy)]
pub struct IdentityResolver<'a> {
    session: &'a SessionContext,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(session: &'a SessionContext) -> Self {
        Self { session }
    }

    /// Derives the stable key of a contact.
    ///
    /// Pure function of `(display_name, alias)`; total, including contacts
    /// with an empty alias.
    pub fn resolve_stable_key(contact: &Contact) -> StableConversationKey {
        StableConversationKey::from(contact)
    }

    /// Derives the stable key for a contact currently known by `ephemeral_id`.
    ///
    /// Returns `None` when the id is not in this session's directory.
    pub fn stable_key_for(&self, ephemeral_id: &str) -> Option<StableConversationKey> {
        self.session
            .contact(ephemeral_id)
            .map(Self::resolve_stable_key)
    }

    /// Finds the ephemeral id the contact behind `key` has in this session.
    ///
    /// Returns the first match in directory order, or `None` when no live
    /// contact derives to `key` (the partner is no longer a contact).
    pub fn resolve_ephemeral_id(&self, key: &StableConversationKey) -> Option<&'a str> {
        self.session
            .contacts()
            .find(|contact| key.matches(contact))
            .map(|contact| contact.ephemeral_id.as_str())
    }
}
