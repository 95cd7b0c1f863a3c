// Copyright 2026 the Farsight Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for the perception index.

use alloc::string::String;
use alloc::vec::Vec;

/// Rejected backend parameters.
///
/// Configuration errors are fatal at setup: the offending backend is never
/// constructed.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Grid cells must have strictly positive, finite dimensions.
    #[error("grid cell size must be strictly positive, got {width}x{height}")]
    NonPositiveCellSize {
        /// Requested cell width.
        width: f64,
        /// Requested cell height.
        height: f64,
    },
    /// The tree split threshold must allow at least one record per leaf.
    #[error("tree split size must be at least 1")]
    ZeroSplitSize,
    /// The indexed region must enclose a positive area.
    #[error("scenario bounds must enclose a positive area")]
    EmptyBounds,
}

/// A state update referenced traffic lights that were never registered.
///
/// This is recoverable: every registered light in the batch has already
/// been updated when this error is returned.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("state update referenced {} unregistered traffic light(s)", unknown.len())]
pub struct LookupError {
    /// The ids that were not found, in batch order.
    pub unknown: Vec<String>,
}
