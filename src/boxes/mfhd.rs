use super::Fourcc;
use crate::{ParseError, Reader, Result};

#[derive(Clone, Debug)]
pub struct MfhdBox {
    /// Ordinal of this movie fragment within the stream, as assigned by the
    /// muxer.
    pub sequence_number: u32,
}

impl MfhdBox {
    /// Parses a `mfhd` box body.
    ///
    /// The layout is fixed and tiny, so the decode is strict: the body must
    /// be exactly 8 bytes with version 0 and zero flags.
    pub fn parse(reader: &mut Reader) -> Result<Self> {
        if reader.remaining() != 8 {
            return Err(ParseError::Malformed {
                fourcc: Fourcc::MFHD,
                reason: "body must be exactly 8 bytes",
            });
        }

        let version = reader.read_u8()?;

        if version != 0 {
            return Err(ParseError::UnsupportedVersion {
                fourcc: Fourcc::MFHD,
                version,
            });
        }

        if reader.read_u24()? != 0 {
            return Err(ParseError::Malformed {
                fourcc: Fourcc::MFHD,
                reason: "flags must be zero",
            });
        }

        Ok(Self {
            sequence_number: reader.read_u32()?,
        })
    }
}
