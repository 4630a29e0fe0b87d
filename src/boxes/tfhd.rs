use super::Fourcc;
use crate::{ParseError, Reader, Result};

#[derive(Clone, Debug)]
pub struct TfhdBox {
    pub version: u8,
    /// Raw 24 bit flags. Bits without a dedicated field below, such as
    /// [`TfhdBox::DURATION_IS_EMPTY`] and [`TfhdBox::DEFAULT_BASE_IS_MOOF`],
    /// stay observable here.
    pub flags: u32,
    /// An integer that uniquely identifies this track over the entire
    /// lifetime of this presentation.
    pub track_id: u32,
    /// If specified via flags, the base offset for data references within
    /// this track fragment.
    pub base_data_offset: Option<u64>,
    /// If specified via flags, the sample description to apply to this
    /// fragment's samples.
    pub sample_description_index: Option<u32>,
    /// If specified via flags, this overrides the default sample duration
    /// for this fragment.
    pub default_sample_duration: Option<u32>,
    /// If specified via flags, this overrides the default sample size for
    /// this fragment.
    pub default_sample_size: Option<u32>,
    /// If specified via flags, this overrides the default sample flags for
    /// this fragment.
    pub default_sample_flags: Option<u32>,
}

impl TfhdBox {
    pub const BASE_DATA_OFFSET_PRESENT: u32 = 0x000001;
    pub const SAMPLE_DESCRIPTION_INDEX_PRESENT: u32 = 0x000002;
    pub const DEFAULT_SAMPLE_DURATION_PRESENT: u32 = 0x000008;
    pub const DEFAULT_SAMPLE_SIZE_PRESENT: u32 = 0x000010;
    pub const DEFAULT_SAMPLE_FLAGS_PRESENT: u32 = 0x000020;
    pub const DURATION_IS_EMPTY: u32 = 0x010000;
    pub const DEFAULT_BASE_IS_MOOF: u32 = 0x020000;

    /// Parses a `tfhd` box body.
    ///
    /// Optional fields appear in a fixed order, each gated by its flag bit;
    /// an absent field is `None`, never a synthesized default.
    pub fn parse(reader: &mut Reader) -> Result<Self> {
        let version = reader.read_u8()?;

        if version != 0 {
            return Err(ParseError::UnsupportedVersion {
                fourcc: Fourcc::TFHD,
                version,
            });
        }

        let flags = reader.read_u24()?;

        let mut tfhd = Self {
            version,
            flags,
            track_id: reader.read_u32()?,
            base_data_offset: None,
            sample_description_index: None,
            default_sample_duration: None,
            default_sample_size: None,
            default_sample_flags: None,
        };

        // Read "base_data_offset" if present.
        if flags & Self::BASE_DATA_OFFSET_PRESENT != 0 {
            tfhd.base_data_offset = Some(reader.read_u64()?);
        }

        // Read "sample_description_index" if present.
        if flags & Self::SAMPLE_DESCRIPTION_INDEX_PRESENT != 0 {
            tfhd.sample_description_index = Some(reader.read_u32()?);
        }

        // Read "default_sample_duration" if present.
        if flags & Self::DEFAULT_SAMPLE_DURATION_PRESENT != 0 {
            tfhd.default_sample_duration = Some(reader.read_u32()?);
        }

        // Read "default_sample_size" if present.
        if flags & Self::DEFAULT_SAMPLE_SIZE_PRESENT != 0 {
            tfhd.default_sample_size = Some(reader.read_u32()?);
        }

        // Read "default_sample_flags" if present.
        if flags & Self::DEFAULT_SAMPLE_FLAGS_PRESENT != 0 {
            tfhd.default_sample_flags = Some(reader.read_u32()?);
        }

        Ok(tfhd)
    }
}
