//! Cache module for the project list
//!
//! This module provides a single-slot, in-memory cache with a configurable TTL
//! (time-to-live). Expired snapshots are never served; a failed refresh leaves
//! the previous snapshot in place until the next successful fetch overwrites it.

mod manager;

pub use manager::{CacheState, CacheStats, CacheStatus, CachedProjects, ProjectCache, Snapshot};
