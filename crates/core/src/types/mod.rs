//! Core types for tagsmith.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod placement;
pub mod status;

pub use id::*;
pub use placement::{Placement, PlacementParseError};
pub use status::{SyncStatus, SyncStatusParseError};
