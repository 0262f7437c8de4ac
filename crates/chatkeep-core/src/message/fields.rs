//! Well-known message field names.

/// Ephemeral id of the conversation partner.
pub const PEER: &str = "peer";
/// Ephemeral id of whoever actually sent the message.
pub const ACTUAL_SENDER: &str = "actual_sender";
/// Display name of the peer, written at append time.
pub const PEER_DISPLAY_NAME: &str = "peer_display_name";
/// Alias of the peer, written at append time.
pub const PEER_ALIAS: &str = "peer_alias";
/// Delivery status; restored messages are reset to [`STATUS_DELIVERED`].
pub const STATUS: &str = "status";
/// Unread marker; restored messages are always read.
pub const UNREAD: &str = "unread";

pub const STATUS_DELIVERED: i64 = 0;
