//! Command implementations for join-vcfs.

pub mod join;

pub use crate::streaming::verify_sorted;
pub use join::{join_vcfs, JoinCommand, JoinStats, VcfBinStream};
