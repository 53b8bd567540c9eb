//! Pipeline step implementations.
//!
//! Each step moves a group one stage forward in the recovery pipeline.

mod classify;
mod cleanup;
mod metadata;
mod mux;
mod pair;
mod trim;

pub use classify::ClassifyStep;
pub use cleanup::CleanupStep;
pub use metadata::MetadataStep;
pub use mux::MuxStep;
pub use pair::PairStep;
pub use trim::{TrimStep, MIN_FRAGMENTS};
