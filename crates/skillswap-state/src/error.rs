//! Errors raised when a caller asks for a transition the lifecycle forbids.

use thiserror::Error;

use crate::status::SwapStatus;

/// A requested lifecycle step was refused.
///
/// Authorization failures are reported before state failures: a third party
/// asking to complete a declined request gets `Forbidden`, not
/// `InvalidTransition`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    /// The caller does not hold the role this step requires.
    #[error("{0}")]
    Forbidden(&'static str),

    /// The record is not in a state from which the step is allowed.
    #[error("{reason} (cannot {action} while {from})")]
    InvalidTransition {
        /// Status the record is in.
        from: SwapStatus,
        /// The refused step: `accept`, `decline`, `complete` or `cancel`.
        action: &'static str,
        /// Human-readable explanation.
        reason: &'static str,
    },

    /// Requester and provider are the same principal.
    #[error("you cannot send a swap request to yourself")]
    SelfRequest,
}
