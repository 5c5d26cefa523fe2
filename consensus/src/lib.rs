//! # Chain State Invariants
//!
//! The engine keeps three structures consistent with each other: the header records
//! (hash to header and [`BlockStatus`](arbor_consensus_core::blockstatus::BlockStatus)),
//! the height index (height to hash) and the [`ChainTip`](arbor_consensus_core::chain_tip::ChainTip).
//!
//! ## Terminology
//!
//! Let:
//! - **best** be the best block at height `depth`
//! - **vi** be the validation index at height `vh`
//! - **A** be the active chain, the blocks the height index maps at heights `0..=depth`
//!
//! ## Invariants
//!
//! ```text
//! vh <= depth
//! A[h] has status FullyValid(h) or AssumedValid(h)   for h <= vh
//! A[h] has status HeadersOnly(h)                     for vh < h <= depth
//! every other placeable header has status InFork(h)
//! ```
//!
//! The accumulator snapshot held in memory is the one produced by connecting `vi`, and
//! a snapshot is stored for every height in the retention window below `vh`.
//!
//! ## Implications for Code
//!
//! - Index entries above `depth` are stale and are never read as part of the active chain.
//! - A best chain switch rolls `vi` back to the fork point whenever `vh` lies above it, so
//!   the accumulator never reflects blocks outside of **A**.
//! - Headers are durable as soon as they are written. The tip and snapshots become durable
//!   on flush, so on startup any validated status above the persisted `vh` is demoted.

pub mod consensus;
pub mod interval;
pub mod model;
pub mod notify;
pub mod pipeline;
pub mod processes;
pub mod test_helpers;
