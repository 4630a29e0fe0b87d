use super::{BoxHeader, Fourcc, TfdtBox, TfhdBox, TrunBox};
use crate::{ParseError, Reader, Result};
use log::trace;

#[derive(Clone, Debug)]
pub struct TrafBox {
    /// The mandatory track fragment header.
    pub tfhd: TfhdBox,
    /// Decode time of the fragment's first sample, if signalled.
    pub tfdt: Option<TfdtBox>,
    /// Sample runs in stream order. May be empty.
    pub truns: Vec<TrunBox>,
}

impl TrafBox {
    /// Parses a `traf` box body, walking its children in stream order.
    ///
    /// Unrecognized children are skipped over their declared size. A missing
    /// `tfhd` fails the fragment; a repeated `tfhd` or `tfdt` replaces the
    /// earlier one. Multiple `trun` children stay separate runs.
    pub fn parse(reader: &mut Reader) -> Result<Self> {
        let mut tfhd = None;
        let mut tfdt = None;
        let mut truns = Vec::new();

        while reader.has_more_data() {
            let header = BoxHeader::parse(reader).ok_or(ParseError::Malformed {
                fourcc: Fourcc::TRAF,
                reason: "truncated child box header",
            })?;
            let body_size = header.body_size()?;

            if body_size > reader.remaining() as u64 {
                return Err(ParseError::InvalidSize {
                    fourcc: header.fourcc,
                    size: header.size,
                });
            }

            let mut body = reader.sub_reader(body_size as usize)?;

            match header.fourcc {
                Fourcc::TFHD => tfhd = Some(TfhdBox::parse(&mut body)?),
                Fourcc::TFDT => tfdt = Some(TfdtBox::parse(&mut body)?),
                Fourcc::TRUN => truns.push(TrunBox::parse(&mut body)?),
                fourcc => trace!("skipping {fourcc} box ({} bytes) inside traf", header.size),
            }
        }

        let tfhd = tfhd.ok_or(ParseError::MissingChild {
            parent: Fourcc::TRAF,
            child: Fourcc::TFHD,
        })?;

        Ok(Self { tfhd, tfdt, truns })
    }
}
