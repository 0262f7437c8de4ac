//! Identity resolution between session-scoped ids and stable conversation keys.

mod key;
mod resolver;

pub use key::{KEY_SEPARATOR, StableConversationKey};
pub use resolver::IdentityResolver;
