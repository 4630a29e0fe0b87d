//! Error types for box parsing.

use crate::boxes::Fourcc;
use thiserror::Error;

/// Errors that can occur while decoding box structures.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A checked read ran past the end of the buffered bytes.
    #[error("unexpected end of data at offset {offset}: {needed} bytes needed, {available} available")]
    UnexpectedEnd {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A box declared a size inconsistent with its own header or its container.
    #[error("invalid size {size} for {fourcc} box")]
    InvalidSize { fourcc: Fourcc, size: u64 },

    /// A box version the decoder does not understand.
    #[error("unsupported version {version} for {fourcc} box")]
    UnsupportedVersion { fourcc: Fourcc, version: u8 },

    /// A fixed-layout invariant was violated inside a box body.
    #[error("malformed {fourcc} box: {reason}")]
    Malformed { fourcc: Fourcc, reason: &'static str },

    /// A container box was missing a child it must carry.
    #[error("{parent} box has no {child} child")]
    MissingChild { parent: Fourcc, child: Fourcc },

    /// The data does not start with the box type the parser expected.
    #[error("expected a {expected} box, found {found}")]
    UnexpectedBox { expected: Fourcc, found: Fourcc },
}
