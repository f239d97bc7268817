//! Bounded containers for reservoir-style stream sampling.
//!
//! These are the storage pieces a fixed-memory edge sampler is built from: a
//! priority queue that exposes its minimum, an insertion-ordered waiting
//! room, and a slotted reservoir with O(1) removal by identity. None of them
//! know anything about graphs; the sampler supplies the policy.

pub mod heap;
pub mod reservoir;
pub mod waiting_room;

pub use crate::{heap::BoundedMinHeap, reservoir::Reservoir, waiting_room::WaitingRoom};
