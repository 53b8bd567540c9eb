//! cachemux core - recovers playable media from cached stream fragments.
//!
//! This crate contains all pipeline logic with zero CLI dependencies:
//! header trimming, stream classification, pairing, metadata naming,
//! ffmpeg remuxing and cleanup, plus the batch runner that drives them.

pub mod cleanup;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod metadata;
pub mod models;
pub mod mux;
pub mod orchestrator;
pub mod pairing;
pub mod probe;
pub mod tools;
pub mod trim;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_returns_value() {
        assert!(!version().is_empty());
    }
}
