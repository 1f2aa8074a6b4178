//! Control Commands
//!
//! Inbound control messages received on the command topic. The only
//! recognized action is `kill`; anything else is a forward-compatible
//! no-op.

use serde::{Deserialize, Serialize};

/// Action string that requests shutdown.
const KILL_ACTION: &str = "kill";

/// A decoded control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Requested action.
    pub command: String,
}

impl Command {
    /// Whether this command requests shutdown, regardless of casing.
    #[must_use]
    pub fn is_kill(&self) -> bool {
        self.command.eq_ignore_ascii_case(KILL_ACTION)
    }
}
