use crate::{Reader, Result};

#[derive(Clone, Debug)]
pub struct TfdtBox {
    /// The absolute decode time, measured on the media timeline, of the
    /// first sample in decode order in the track fragment.
    pub base_media_decode_time: u64,
}

impl TfdtBox {
    /// Parses a `tfdt` box body.
    pub fn parse(reader: &mut Reader) -> Result<Self> {
        let version = reader.read_u8()?;
        reader.skip(3)?; // flags, unused

        Ok(Self {
            base_media_decode_time: if version == 1 {
                reader.read_u64()?
            } else {
                reader.read_u32()? as u64
            },
        })
    }
}
