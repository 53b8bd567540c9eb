//! Data models for cachemux.
//!
//! This module contains the core data structures shared by every stage:
//! - Enums for stream kinds, pipeline stages and policies
//! - Media structures (fragments, groups)
//! - Job structures (metadata, output jobs, outcomes)

mod enums;
mod jobs;
mod media;

// Re-export all public types
pub use enums::{CleanupPolicy, CollisionPolicy, GroupStage, ProbeStrategy, StreamKind};
pub use jobs::{BatchReport, GroupOutcome, Metadata, OutputJob};
pub use media::{Fragment, Group};
