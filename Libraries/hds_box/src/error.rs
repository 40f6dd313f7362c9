//! Error types for hds_box.

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// Result type for hds_box operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for hds_box operations.
///
/// Field accessors never return these: they swallow the error and leave the
/// box unchanged. Only the resize primitive, stream reading and the file
/// helpers surface them.
#[derive(Debug, Error)]
pub enum Error {
    /// The box borrows its bytes and cannot be resized or replaced.
    #[error("box is a borrowed view and cannot be modified")]
    NotOwned,

    /// Not enough bytes are available yet for a complete box.
    #[error("incomplete box: need {need} bytes, have {have}")]
    Incomplete { need: usize, have: usize },

    /// The declared box size is smaller than the box header.
    #[error("invalid box size {0}, a box is at least 8 bytes")]
    InvalidSize(usize),

    /// The resized box would no longer fit the 32-bit length prefix.
    #[error("box size {0} does not fit in the 32-bit length prefix")]
    TooLarge(usize),

    /// The region handed to `reserve` does not lie inside the box.
    #[error("region at {position} with size {current} lies outside the {total} byte box")]
    OutOfRange {
        position: usize,
        current: usize,
        total: usize,
    },

    /// Growing the buffer failed.
    #[error("allocation failed: {0}")]
    Alloc(#[from] TryReserveError),

    /// I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A box configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
