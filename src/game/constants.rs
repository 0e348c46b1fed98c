//! Game-level constants.

/// Reserved identity of the game host. The transport layer is responsible
/// for authenticating which connection speaks as this identity.
pub const MODERATOR: &str = "@HOST";

/// Default countdown, in seconds, for answering a selected question.
pub const DEFAULT_ANSWER_SECS: u32 = 10;

/// Default countdown, in seconds, for the buzz window.
pub const DEFAULT_BUZZ_SECS: u32 = 10;
