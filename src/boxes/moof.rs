use super::{BoxHeader, Fourcc, MfhdBox, TrafBox};
use crate::{ParseError, Reader, Result};
use log::trace;

#[derive(Clone, Debug)]
pub struct MoofBox {
    /// The mandatory movie fragment header.
    pub mfhd: MfhdBox,
    /// One entry per track fragment, in stream order. May be empty.
    pub trafs: Vec<TrafBox>,
}

impl MoofBox {
    /// Parses a complete `moof` box, reader positioned at its first size
    /// byte.
    ///
    /// The whole box must already be buffered; this is a one shot decode
    /// with no notion of resuming. On any failure nothing is returned, a
    /// fragment tree is never handed out half built.
    pub fn parse(reader: &mut Reader) -> Result<Self> {
        let header = BoxHeader::parse(reader).ok_or(ParseError::Malformed {
            fourcc: Fourcc::MOOF,
            reason: "truncated box header",
        })?;

        if header.fourcc != Fourcc::MOOF {
            return Err(ParseError::UnexpectedBox {
                expected: Fourcc::MOOF,
                found: header.fourcc,
            });
        }

        let body_size = header.body_size()?;

        if body_size > reader.remaining() as u64 {
            return Err(ParseError::InvalidSize {
                fourcc: Fourcc::MOOF,
                size: header.size,
            });
        }

        let mut body = reader.sub_reader(body_size as usize)?;
        let mut mfhd = None;
        let mut trafs = Vec::new();

        while body.has_more_data() {
            let child = BoxHeader::parse(&mut body).ok_or(ParseError::Malformed {
                fourcc: Fourcc::MOOF,
                reason: "truncated child box header",
            })?;
            let child_body_size = child.body_size()?;

            if child_body_size > body.remaining() as u64 {
                return Err(ParseError::InvalidSize {
                    fourcc: child.fourcc,
                    size: child.size,
                });
            }

            let mut child_body = body.sub_reader(child_body_size as usize)?;

            match child.fourcc {
                Fourcc::MFHD => mfhd = Some(MfhdBox::parse(&mut child_body)?),
                Fourcc::TRAF => trafs.push(TrafBox::parse(&mut child_body)?),
                fourcc => trace!("skipping {fourcc} box ({} bytes) inside moof", child.size),
            }
        }

        let mfhd = mfhd.ok_or(ParseError::MissingChild {
            parent: Fourcc::MOOF,
            child: Fourcc::MFHD,
        })?;

        trace!(
            "moof: sequence {}, {} track fragment(s)",
            mfhd.sequence_number,
            trafs.len()
        );

        Ok(Self { mfhd, trafs })
    }
}
