//! consensus/mod.rs
//!
//! Building blocks of one Ben-Or round, independent of any node lifecycle:
//! majority detection, the tie-break policy, the per-round message buffer and
//! the bounded quorum wait.

pub mod majority;
pub mod store;
pub mod tiebreak;
pub mod waiter;
