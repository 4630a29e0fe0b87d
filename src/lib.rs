//! This crate contains parsers for the fragmented mp4 (ISO base media file
//! format) boxes used by DASH adaptive streaming.
//!
//! Two parsers cover the metadata a demuxer needs to locate and timestamp
//! media samples without buffering whole files:
//!
//! - [`boxes::MoofBox::parse`] decodes a complete, already buffered movie
//!   fragment box into an owned tree of track fragments and sample runs.
//! - [`SidxParser`] decodes a segment index box incrementally, one
//!   arbitrarily sized buffer at a time, as bytes arrive from a network
//!   source.
//!
//! Both are built on [`Reader`] and [`boxes::BoxHeader`], which can also be
//! used directly to classify and skip boxes in a stream.

pub mod boxes;

mod error;
mod reader;
mod sidx;

pub use error::ParseError;
pub use reader::Reader;
pub use sidx::{SidxBox, SidxBoxEntry, SidxParser, SidxStatus};

/// A `Result` alias where the `Err` case is `mp4frag::ParseError`.
pub type Result<T> = std::result::Result<T, ParseError>;

// Wire-declared counts are not trusted for up-front allocation; vectors
// reserve at most this many entries and grow past that on demand.
pub(crate) const PREALLOC_LIMIT: usize = 1024;
