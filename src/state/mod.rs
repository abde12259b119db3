//! State Management Module
//!
//! Tracks cluster membership, master state, and drives the ring-based
//! election protocol.

mod membership;
pub mod election;

pub use membership::{AddOutcome, HeartbeatOutcome, MasterResolution, MasterState, Membership};
pub use election::{ElectionEngine, VoteMessage};
