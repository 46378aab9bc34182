//! Shared foundational types used across the kiln build-state toolchain.
//!
//! This crate provides content hashing for snapshots and task identities, and
//! the path sensitivity setting shared by configuration and change detection.

#![warn(missing_docs)]

pub mod hash;
pub mod path;

pub use hash::{ContentHash, ContentHasher};
pub use path::PathSensitivity;
