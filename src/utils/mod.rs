//! Shared utilities
//!
//! - [`fs`] - Atomic file writes and tolerant reads used by the storage backends

pub mod fs;
