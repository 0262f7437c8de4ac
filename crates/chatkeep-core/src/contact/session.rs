//! Per-login contact directory.

use super::model::Contact;
use std::collections::HashMap;

/// Read-only snapshot of the host's contact directory for one login session.
///
/// Contacts keep the order in which the host listed them so that reverse
/// lookups return the first match deterministically. The snapshot is
/// replaced wholesale on re-login and never mutated in place.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    contacts: Vec<Contact>,
    by_ephemeral_id: HashMap<String, usize>,
}

impl SessionContext {
    /// Creates a session context from the host's directory listing.
    ///
    /// If the host lists the same ephemeral id twice, the later record wins
    /// for direct lookups while both stay visible to directory scans.
    pub fn new(contacts: impl IntoIterator<Item = Contact>) -> Self {
        let contacts: Vec<Contact> = contacts.into_iter().collect();
        let by_ephemeral_id = contacts
            .iter()
            .enumerate()
            .map(|(index, contact)| (contact.ephemeral_id.clone(), index))
            .collect();

        Self {
            contacts,
            by_ephemeral_id,
        }
    }

    /// Looks up a contact by its session-scoped identifier.
    pub fn contact(&self, ephemeral_id: &str) -> Option<&Contact> {
        self.by_ephemeral_id
            .get(ephemeral_id)
            .map(|&index| &self.contacts[index])
    }

    /// Iterates contacts in directory order.
    pub fn contacts(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}
