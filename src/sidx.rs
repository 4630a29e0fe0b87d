use crate::boxes::{BoxHeader, Fourcc};
use crate::{PREALLOC_LIMIT, ParseError, Reader, Result};
use log::{debug, trace};

/// Clock rate all sidx tick values are rescaled to.
const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Progress of a [`SidxParser`] through the box. States advance strictly
/// forward; only [`SidxParser::clear`] goes back to `Init`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SidxStatus {
    /// Waiting for the version and flags.
    #[default]
    Init,
    /// Waiting for the fixed header fields.
    Header,
    /// Decoding reference entries.
    Data,
    /// All declared entries decoded.
    Finished,
}

/// One decoded sidx reference entry.
#[derive(Clone, Debug, Default)]
pub struct SidxBoxEntry {
    /// 0 references media, 1 references another sidx box.
    pub reference_type: u8,
    /// Byte length of the referenced material.
    pub referenced_size: u32,
    /// Subsegment duration, rescaled to nanoseconds.
    pub duration: u64,
    pub starts_with_sap: bool,
    pub sap_type: u8,
    pub sap_delta_time: u32,
    /// Byte offset of the referenced material from the end of the sidx box,
    /// the running sum of earlier entries' sizes.
    pub offset: u64,
    /// Presentation time of the subsegment in nanoseconds, the earliest
    /// presentation time plus the running sum of earlier entries' durations.
    pub pts: u64,
}

/// Decoded `sidx` box contents.
#[derive(Clone, Debug, Default)]
pub struct SidxBox {
    pub version: u8,
    pub flags: u32,
    /// Stream ID the index applies to.
    pub reference_id: u32,
    /// Ticks per second for the raw time fields.
    pub timescale: u32,
    /// Earliest presentation time, in timescale ticks as read.
    pub earliest_pts: u64,
    /// Distance from the end of the sidx box to the first referenced byte.
    pub first_offset: u64,
    pub entries_count: u16,
    /// Iteration cursor for consumers walking `entries`; not used by the
    /// parser itself beyond resetting it.
    pub entry_index: usize,
    /// Decoded entries in stream order. Grows across calls until
    /// `entries_count` is reached.
    pub entries: Vec<SidxBoxEntry>,
}

/// Incremental `sidx` box parser.
///
/// Segment indexes arrive from the network in arbitrarily sized pieces, so
/// this parser keeps its progress in `status` and consumes whole units per
/// call (the version/flags word, the fixed header, 12 byte entries), never
/// bytes of a partially available unit. Feed it with [`add_buffer`] starting
/// at the first size byte of the box, or drive [`parse`] directly with a
/// reader already positioned past the box header.
///
/// [`add_buffer`]: SidxParser::add_buffer
/// [`parse`]: SidxParser::parse
#[derive(Clone, Debug, Default)]
pub struct SidxParser {
    pub status: SidxStatus,
    /// Declared size of the box being parsed, header included. Set by
    /// [`SidxParser::add_buffer`].
    pub size: u64,
    pub sidx: SidxBox,
    cumulative_entry_size: u64,
    cumulative_pts: u64,
}

impl SidxParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets the parser for a new box, discarding all decoded state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Drives the state machine from `reader`, resuming wherever the last
    /// call left off.
    ///
    /// The reader must be positioned just past the box header, at the
    /// version byte. Returns `Ok(())` both when more input is needed (the
    /// status tells which unit is still incomplete) and on completion
    /// (status [`SidxStatus::Finished`]); the reader's final position is the
    /// number of bytes consumed, and consumed bytes must not be presented
    /// again.
    pub fn parse(&mut self, reader: &mut Reader) -> Result<()> {
        if self.status == SidxStatus::Init {
            if reader.remaining() < 4 {
                return Ok(());
            }

            self.sidx.version = reader.read_u8()?;
            // Unlike every other flags field in this crate, sidx box flags
            // are read little-endian.
            self.sidx.flags = reader.read_u24_le()?;

            self.status = SidxStatus::Header;
        }

        if self.status == SidxStatus::Header {
            let needed = 12 + if self.sidx.version == 0 { 8 } else { 16 };

            if reader.remaining() < needed {
                return Ok(());
            }

            self.sidx.reference_id = reader.read_u32()?;
            self.sidx.timescale = reader.read_u32()?;

            if self.sidx.timescale == 0 {
                return Err(ParseError::Malformed {
                    fourcc: Fourcc::SIDX,
                    reason: "timescale must not be zero",
                });
            }

            if self.sidx.version == 0 {
                self.sidx.earliest_pts = u64::from(reader.read_u32()?);
                self.sidx.first_offset = u64::from(reader.read_u32()?);
            } else {
                self.sidx.earliest_pts = reader.read_u64()?;
                self.sidx.first_offset = reader.read_u64()?;
            }

            // reserved
            reader.skip(2)?;
            self.sidx.entries_count = reader.read_u16()?;

            self.sidx.entry_index = 0;
            self.sidx.entries =
                Vec::with_capacity((self.sidx.entries_count as usize).min(PREALLOC_LIMIT));
            self.cumulative_entry_size = 0;
            self.cumulative_pts = ticks_to_ns(self.sidx.earliest_pts, self.sidx.timescale);

            debug!(
                "sidx: version {}, reference id {}, timescale {}, {} entries",
                self.sidx.version, self.sidx.reference_id, self.sidx.timescale,
                self.sidx.entries_count
            );

            self.status = SidxStatus::Data;
        }

        if self.status == SidxStatus::Data {
            while self.sidx.entries.len() < self.sidx.entries_count as usize {
                // Entries are consumed whole. Stopping at the boundary keeps
                // the resume point aligned for the next call.
                if reader.remaining() < 12 {
                    return Ok(());
                }

                let mut entry = SidxBoxEntry {
                    offset: self.cumulative_entry_size,
                    pts: self.cumulative_pts,
                    ..Default::default()
                };

                // 1 bit reference_type, 31 bits referenced_size.
                let word = reader.read_u32()?;
                entry.reference_type = (word >> 31) as u8;
                entry.referenced_size = word & 0x7FFF_FFFF;

                entry.duration = ticks_to_ns(u64::from(reader.read_u32()?), self.sidx.timescale);

                // 1 bit starts_with_sap, 3 bits sap_type, 28 bits sap_delta_time.
                let word = reader.read_u32()?;
                entry.starts_with_sap = word >> 31 != 0;
                entry.sap_type = ((word >> 28) & 0x7) as u8;
                entry.sap_delta_time = word & 0x0FFF_FFFF;

                self.cumulative_entry_size += u64::from(entry.referenced_size);
                self.cumulative_pts = self.cumulative_pts.saturating_add(entry.duration);

                trace!(
                    "sidx entry {}: offset {}, pts {}, {} bytes",
                    self.sidx.entries.len(),
                    entry.offset,
                    entry.pts,
                    entry.referenced_size
                );
                self.sidx.entries.push(entry);
            }

            self.sidx.entry_index = 0;
            self.status = SidxStatus::Finished;
        }

        Ok(())
    }

    /// Feeds the next piece of the stream, returning how many of its bytes
    /// were consumed. Unconsumed bytes must be presented again in the next
    /// call's buffer.
    ///
    /// The first consuming call expects `data` to start at the first size
    /// byte of a `sidx` box; a buffer starting with some other box type is
    /// refused with nothing consumed, so the caller can route it elsewhere.
    /// The box header only counts as consumed once the version and flags
    /// behind it are available too, which keeps the parser from stranding
    /// itself between the two across calls.
    pub fn add_buffer(&mut self, data: &[u8]) -> Result<usize> {
        let mut reader = Reader::new(data);

        if self.status == SidxStatus::Init {
            let Some(header) = BoxHeader::parse(&mut reader) else {
                return Ok(0);
            };

            if header.fourcc != Fourcc::SIDX {
                return Err(ParseError::UnexpectedBox {
                    expected: Fourcc::SIDX,
                    found: header.fourcc,
                });
            }

            if header.size == 0 {
                return Err(ParseError::InvalidSize {
                    fourcc: Fourcc::SIDX,
                    size: header.size,
                });
            }

            if reader.remaining() < 4 {
                return Ok(0);
            }

            self.size = header.size;
        }

        self.parse(&mut reader)?;
        Ok(reader.position())
    }
}

/// Rescales a tick count against `timescale` into nanoseconds, rounding to
/// nearest so error does not accumulate across entries. The multiply is
/// exact in u128; a result beyond `u64::MAX` saturates.
fn ticks_to_ns(ticks: u64, timescale: u32) -> u64 {
    let scaled = (u128::from(ticks) * u128::from(NANOS_PER_SECOND)
        + u128::from(timescale / 2))
        / u128::from(timescale);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}
