//! # skillswap-state: Swap Request Lifecycle
//!
//! The negotiation between a requester and a provider, expressed as pure
//! functions over an immutable record.
//!
//! ## States
//!
//! ```text
//! pending ──▶ accepted ──▶ completed (terminal)
//!    │
//!    ├──▶ declined (terminal)
//!    │
//!    └──▶ (deleted)
//! ```
//!
//! ## Design
//!
//! Every transition method takes `&self`, checks who is asking before it
//! checks the current status, and returns the *next* record. Nothing here
//! touches storage or a clock: persistence is the repository's job and the
//! caller supplies `now`. That lets the service layer write the result with a
//! conditional update keyed on the status it observed.

pub mod error;
pub mod status;
pub mod swap;

pub use error::TransitionError;
pub use status::SwapStatus;
pub use swap::{NewSwapRequest, PartyRole, RespondAction, SwapRequest};
