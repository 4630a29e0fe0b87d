use crate::{ParseError, Reader, Result};
use std::fmt;

/// A four character box type code, in wire byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fourcc(pub [u8; 4]);

impl Fourcc {
    pub const MDAT: Fourcc = Fourcc(*b"mdat");
    pub const MFHD: Fourcc = Fourcc(*b"mfhd");
    pub const MOOF: Fourcc = Fourcc(*b"moof");
    pub const MOOV: Fourcc = Fourcc(*b"moov");
    pub const SIDX: Fourcc = Fourcc(*b"sidx");
    pub const STYP: Fourcc = Fourcc(*b"styp");
    pub const TFDT: Fourcc = Fourcc(*b"tfdt");
    pub const TFHD: Fourcc = Fourcc(*b"tfhd");
    pub const TRAF: Fourcc = Fourcc(*b"traf");
    pub const TRUN: Fourcc = Fourcc(*b"trun");
    pub const UUID: Fourcc = Fourcc(*b"uuid");
}

impl fmt::Display for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }

        Ok(())
    }
}

impl fmt::Debug for Fourcc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fourcc({self})")
    }
}

/// The universal ISO BMFF box header.
///
/// `size` is the full box length including the header itself; `header_size`
/// is the number of bytes the header occupied, so `size - header_size` is
/// the body length to consume or recurse into.
#[derive(Clone, Debug)]
pub struct BoxHeader {
    pub fourcc: Fourcc,
    /// User type bytes, present only for `uuid` boxes.
    pub extended_type: Option<[u8; 16]>,
    pub header_size: u32,
    pub size: u64,
}

impl BoxHeader {
    /// Parses a box header, including the 64-bit largesize (declared 32-bit
    /// size of 1) and the 16-byte `uuid` extended type when present.
    ///
    /// Returns `None` when the reader holds too few bytes for the complete
    /// header, with the position rewound byte-exactly so the call can be
    /// retried once more data has arrived. A header that is fully present
    /// always parses; `size` is returned as declared, including the `0`
    /// convention for "extends to the end of the file", and is not checked
    /// against the remaining input. Whether the box body actually fits is
    /// the caller's decision.
    pub fn parse(reader: &mut Reader) -> Option<BoxHeader> {
        let start = reader.position();

        match Self::parse_from(reader, start) {
            Some(header) => Some(header),
            None => {
                reader.set_position(start);
                None
            }
        }
    }

    fn parse_from(reader: &mut Reader, start: usize) -> Option<BoxHeader> {
        if reader.remaining() < 8 {
            return None;
        }

        let size32 = reader.read_u32().ok()?;
        let mut fourcc = [0; 4];
        fourcc.copy_from_slice(reader.read_bytes(4).ok()?);
        let fourcc = Fourcc(fourcc);

        let size = if size32 == 1 {
            if reader.remaining() < 8 {
                return None;
            }

            reader.read_u64().ok()?
        } else {
            u64::from(size32)
        };

        let extended_type = if fourcc == Fourcc::UUID {
            if reader.remaining() < 16 {
                return None;
            }

            let mut extended_type = [0; 16];
            extended_type.copy_from_slice(reader.read_bytes(16).ok()?);
            Some(extended_type)
        } else {
            None
        };

        Some(BoxHeader {
            fourcc,
            extended_type,
            header_size: (reader.position() - start) as u32,
            size,
        })
    }

    /// Declared body length, `size - header_size`.
    ///
    /// A box whose declared size cannot even cover its own header is
    /// malformed; this includes the `size == 0` convention, which is only
    /// meaningful for a box extending to the end of the file and never for
    /// one nested inside a container.
    pub fn body_size(&self) -> Result<u64> {
        self.size
            .checked_sub(u64::from(self.header_size))
            .ok_or(ParseError::InvalidSize {
                fourcc: self.fourcc,
                size: self.size,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_header() {
        let data = [
            0x00, 0x00, 0x00, 0x10, b'f', b't', b'y', b'p', 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let mut reader = Reader::new(&data);
        let header = BoxHeader::parse(&mut reader).unwrap();

        assert_eq!(header.fourcc, Fourcc(*b"ftyp"));
        assert_eq!(header.size, 16);
        assert_eq!(header.header_size, 8);
        assert_eq!(header.extended_type, None);
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn test_parse_largesize_header() {
        let mut data = vec![0x00, 0x00, 0x00, 0x01, b'm', b'd', b'a', b't'];
        data.extend_from_slice(&(1u64 << 33).to_be_bytes());
        let mut reader = Reader::new(&data);
        let header = BoxHeader::parse(&mut reader).unwrap();

        assert_eq!(header.fourcc, Fourcc::MDAT);
        assert_eq!(header.size, 1 << 33);
        assert_eq!(header.header_size, 16);
    }

    #[test]
    fn test_parse_uuid_header() {
        let extended_type = [0xAB; 16];
        let mut data = vec![0x00, 0x00, 0x00, 0x18, b'u', b'u', b'i', b'd'];
        data.extend_from_slice(&extended_type);
        let mut reader = Reader::new(&data);
        let header = BoxHeader::parse(&mut reader).unwrap();

        assert_eq!(header.fourcc, Fourcc::UUID);
        assert_eq!(header.extended_type, Some(extended_type));
        assert_eq!(header.header_size, 24);
        assert_eq!(header.size, 24);
    }

    #[test]
    fn test_parse_uuid_largesize_header() {
        let mut data = vec![0x00, 0x00, 0x00, 0x01, b'u', b'u', b'i', b'd'];
        data.extend_from_slice(&32u64.to_be_bytes());
        data.extend_from_slice(&[0x01; 16]);
        let mut reader = Reader::new(&data);
        let header = BoxHeader::parse(&mut reader).unwrap();

        assert_eq!(header.fourcc, Fourcc::UUID);
        assert_eq!(header.extended_type, Some([0x01; 16]));
        assert_eq!(header.header_size, 32);
        assert_eq!(header.size, 32);
    }

    #[test]
    fn test_size_zero_is_returned_as_declared() {
        let data = [0x00, 0x00, 0x00, 0x00, b'm', b'd', b'a', b't', 1, 2, 3];
        let mut reader = Reader::new(&data);
        let header = BoxHeader::parse(&mut reader).unwrap();

        assert_eq!(header.fourcc, Fourcc::MDAT);
        assert_eq!(header.size, 0);
        assert_eq!(header.header_size, 8);
    }

    #[test]
    fn test_truncated_header_rewinds() {
        let mut data = vec![0x00, 0x00, 0x00, 0x01, b'u', b'u', b'i', b'd'];
        data.extend_from_slice(&48u64.to_be_bytes());
        data.extend_from_slice(&[0x01; 16]);

        // Every prefix short of the complete 32 byte header must leave the
        // reader untouched.
        for len in 0..data.len() {
            let mut reader = Reader::new(&data[..len]);
            reader.set_position(0);
            assert!(BoxHeader::parse(&mut reader).is_none(), "prefix {len}");
            assert_eq!(reader.position(), 0, "prefix {len}");
        }

        let mut reader = Reader::new(&data);
        assert!(BoxHeader::parse(&mut reader).is_some());
    }

    #[test]
    fn test_rewind_restores_a_nonzero_start() {
        let mut data = vec![0xFF; 5];
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, b'm', b'o', b'o', b'f']);
        let mut reader = Reader::new(&data);
        reader.set_position(5);

        // The largesize field is missing, so the parse must rewind to 5,
        // not to the buffer start.
        assert!(BoxHeader::parse(&mut reader).is_none());
        assert_eq!(reader.position(), 5);
    }

    #[test]
    fn test_fourcc_display_masks_non_ascii() {
        assert_eq!(Fourcc::MOOF.to_string(), "moof");
        assert_eq!(Fourcc([0x00, b'a', 0xFF, b' ']).to_string(), "?a? ");
    }

    #[test]
    fn test_body_size() {
        let mut data = 24u32.to_be_bytes().to_vec();
        data.extend_from_slice(b"mfhd");
        let header = BoxHeader::parse(&mut Reader::new(&data)).unwrap();
        assert_eq!(header.body_size().unwrap(), 16);

        // Sizes below 8 cannot cover the 8 byte header itself (1 is excluded
        // here, it is the largesize escape value rather than a length).
        for size in [0u32, 2, 3, 4, 5, 6, 7] {
            let mut data = size.to_be_bytes().to_vec();
            data.extend_from_slice(b"mfhd");
            let header = BoxHeader::parse(&mut Reader::new(&data)).unwrap();
            assert!(header.body_size().is_err());
        }
    }
}
