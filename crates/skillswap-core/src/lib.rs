#![deny(missing_docs)]
//! # skillswap-core: Foundational Types for SkillSwap
//!
//! The leaf of the workspace DAG. Every other `skillswap-*` crate depends on
//! this one; it depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype wrappers for identifiers.** `UserId` and `SwapRequestId` are
//!    distinct types. A request id cannot be passed where a user id is expected.
//!
//! 2. **Validated text at the boundary.** `SkillLabel` and `Note` trim and
//!    bound their contents at construction. Deserialization routes through the
//!    same constructors, so an invalid value never exists in memory.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is seconds-precision UTC and is
//!    the unit in which credential expiry is expressed.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `skillswap-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod domain;
pub mod error;
pub mod identity;
pub mod temporal;
pub mod text;

pub use domain::{MeetingType, Priority, Timeline};
pub use error::ValidationError;
pub use identity::{SwapRequestId, UserId};
pub use temporal::Timestamp;
pub use text::{Note, SkillLabel, NOTE_MAX_CHARS, SKILL_LABEL_MAX_CHARS};
