use super::Fourcc;
use crate::{PREALLOC_LIMIT, ParseError, Reader, Result};
use log::trace;

#[derive(Clone, Debug)]
pub struct TrunBox {
    /// 0 or 1; version 1 makes per sample composition time offsets signed.
    pub version: u8,
    pub flags: u32,
    /// The number of samples in this run.
    pub sample_count: u32,
    /// If specified via flags, a signed offset from the fragment's base
    /// data offset to this run's first sample.
    pub data_offset: Option<i32>,
    /// If specified via flags, sample flags applying to the first sample
    /// only, overriding the defaults.
    pub first_sample_flags: Option<u32>,
    /// One record per sample, in run order.
    pub samples: Vec<TrunSample>,
}

#[derive(Clone, Debug)]
pub struct TrunSample {
    /// The length of the sample in timescale units.
    pub sample_duration: Option<u32>,
    /// The size of the sample in bytes.
    pub sample_size: Option<u32>,
    /// Packed sample flags, see [`SampleFlags`].
    pub sample_flags: Option<u32>,
    /// Raw 32 bits from the wire; whether they are signed depends on the
    /// parent box version. Interpret through
    /// [`TrunBox::composition_time_offset`].
    pub sample_composition_time_offset: Option<u32>,
}

impl TrunBox {
    pub const DATA_OFFSET_PRESENT: u32 = 0x000001;
    pub const FIRST_SAMPLE_FLAGS_PRESENT: u32 = 0x000004;
    pub const SAMPLE_DURATION_PRESENT: u32 = 0x000100;
    pub const SAMPLE_SIZE_PRESENT: u32 = 0x000200;
    pub const SAMPLE_FLAGS_PRESENT: u32 = 0x000400;
    pub const SAMPLE_COMPOSITION_TIME_OFFSETS_PRESENT: u32 = 0x000800;

    /// Parses a `trun` box body.
    ///
    /// The same presence bits apply uniformly to every sample in the run;
    /// there is no per sample flag variation. A short read anywhere fails
    /// the whole run.
    pub fn parse(reader: &mut Reader) -> Result<Self> {
        let version = reader.read_u8()?;

        if version > 1 {
            return Err(ParseError::UnsupportedVersion {
                fourcc: Fourcc::TRUN,
                version,
            });
        }

        let flags = reader.read_u24()?;
        let sample_count = reader.read_u32()?;

        let mut trun = Self {
            version,
            flags,
            sample_count,
            data_offset: None,
            first_sample_flags: None,
            samples: Vec::with_capacity((sample_count as usize).min(PREALLOC_LIMIT)),
        };

        // Read "data_offset" if present.
        if flags & Self::DATA_OFFSET_PRESENT != 0 {
            trun.data_offset = Some(reader.read_i32()?);
        }

        // Read "first_sample_flags" if present.
        if flags & Self::FIRST_SAMPLE_FLAGS_PRESENT != 0 {
            trun.first_sample_flags = Some(reader.read_u32()?);
        }

        for _ in 0..sample_count {
            let mut sample = TrunSample {
                sample_duration: None,
                sample_size: None,
                sample_flags: None,
                sample_composition_time_offset: None,
            };

            // Read "sample_duration" if present.
            if flags & Self::SAMPLE_DURATION_PRESENT != 0 {
                sample.sample_duration = Some(reader.read_u32()?);
            }

            // Read "sample_size" if present.
            if flags & Self::SAMPLE_SIZE_PRESENT != 0 {
                sample.sample_size = Some(reader.read_u32()?);
            }

            // Read "sample_flags" if present.
            if flags & Self::SAMPLE_FLAGS_PRESENT != 0 {
                sample.sample_flags = Some(reader.read_u32()?);
            }

            // Read "sample_composition_time_offset" if present.
            if flags & Self::SAMPLE_COMPOSITION_TIME_OFFSETS_PRESENT != 0 {
                sample.sample_composition_time_offset = Some(reader.read_u32()?);
            }

            trun.samples.push(sample);
        }

        trace!("trun: version {version}, flags {flags:#08x}, {sample_count} samples");

        Ok(trun)
    }

    /// Composition time offset of the sample at `index`.
    ///
    /// The stored field keeps its raw wire bits because the signedness is a
    /// property of the box, not the sample: version 0 offsets are unsigned,
    /// any later version is two's complement signed.
    pub fn composition_time_offset(&self, index: usize) -> Option<i64> {
        let raw = self.samples.get(index)?.sample_composition_time_offset?;

        Some(if self.version == 0 {
            i64::from(raw)
        } else {
            i64::from(raw as i32)
        })
    }
}

/// Accessors over the ISO packed sample flags carried by `trun` sample
/// records, `trun` first sample flags, and `tfhd` default sample flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleFlags(pub u32);

impl SampleFlags {
    pub fn is_leading(self) -> u8 {
        ((self.0 >> 26) & 0x3) as u8
    }

    pub fn depends_on(self) -> u8 {
        ((self.0 >> 24) & 0x3) as u8
    }

    pub fn is_depended_on(self) -> u8 {
        ((self.0 >> 22) & 0x3) as u8
    }

    pub fn has_redundancy(self) -> u8 {
        ((self.0 >> 20) & 0x3) as u8
    }

    pub fn padding_value(self) -> u8 {
        ((self.0 >> 17) & 0x7) as u8
    }

    pub fn is_non_sync_sample(self) -> bool {
        self.0 & 0x0001_0000 != 0
    }

    pub fn degradation_priority(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_body(version: u8, flags: u32, samples: &[[u32; 4]]) -> Vec<u8> {
        let mut body = vec![version, (flags >> 16) as u8, (flags >> 8) as u8, flags as u8];
        body.extend_from_slice(&(samples.len() as u32).to_be_bytes());

        if flags & TrunBox::DATA_OFFSET_PRESENT != 0 {
            body.extend_from_slice(&(-44i32).to_be_bytes());
        }
        if flags & TrunBox::FIRST_SAMPLE_FLAGS_PRESENT != 0 {
            body.extend_from_slice(&0x0200_0000u32.to_be_bytes());
        }

        for sample in samples {
            let fields = [
                TrunBox::SAMPLE_DURATION_PRESENT,
                TrunBox::SAMPLE_SIZE_PRESENT,
                TrunBox::SAMPLE_FLAGS_PRESENT,
                TrunBox::SAMPLE_COMPOSITION_TIME_OFFSETS_PRESENT,
            ];

            for (value, flag) in sample.iter().zip(fields) {
                if flags & flag != 0 {
                    body.extend_from_slice(&value.to_be_bytes());
                }
            }
        }

        body
    }

    #[test]
    fn test_parse_all_sample_fields() {
        let flags = TrunBox::DATA_OFFSET_PRESENT
            | TrunBox::FIRST_SAMPLE_FLAGS_PRESENT
            | TrunBox::SAMPLE_DURATION_PRESENT
            | TrunBox::SAMPLE_SIZE_PRESENT
            | TrunBox::SAMPLE_FLAGS_PRESENT
            | TrunBox::SAMPLE_COMPOSITION_TIME_OFFSETS_PRESENT;
        let body = make_body(1, flags, &[[100, 1000, 0, 33], [200, 2000, 0x0001_0000, 66]]);
        let trun = TrunBox::parse(&mut Reader::new(&body)).unwrap();

        assert_eq!(trun.version, 1);
        assert_eq!(trun.sample_count, 2);
        assert_eq!(trun.data_offset, Some(-44));
        assert_eq!(trun.first_sample_flags, Some(0x0200_0000));
        assert_eq!(trun.samples.len(), 2);
        assert_eq!(trun.samples[0].sample_duration, Some(100));
        assert_eq!(trun.samples[0].sample_size, Some(1000));
        assert_eq!(trun.samples[0].sample_flags, Some(0));
        assert_eq!(trun.samples[1].sample_duration, Some(200));
        assert_eq!(trun.samples[1].sample_flags, Some(0x0001_0000));
        assert_eq!(trun.composition_time_offset(1), Some(66));
    }

    #[test]
    fn test_parse_no_optional_fields() {
        let body = make_body(0, 0, &[[0; 4], [0; 4], [0; 4]]);
        let trun = TrunBox::parse(&mut Reader::new(&body)).unwrap();

        assert_eq!(trun.sample_count, 3);
        assert_eq!(trun.data_offset, None);
        assert_eq!(trun.first_sample_flags, None);
        assert_eq!(trun.samples.len(), 3);

        for i in 0..3 {
            assert_eq!(trun.samples[i].sample_duration, None);
            assert_eq!(trun.samples[i].sample_size, None);
            assert_eq!(trun.samples[i].sample_flags, None);
            assert_eq!(trun.composition_time_offset(i), None);
        }
    }

    #[test]
    fn test_composition_offset_signedness() {
        // The same raw bits read back unsigned under version 0 and signed
        // under version 1.
        let flags = TrunBox::SAMPLE_COMPOSITION_TIME_OFFSETS_PRESENT;
        let body = make_body(0, flags, &[[0, 0, 0, 0xFFFF_FFFF]]);
        let trun = TrunBox::parse(&mut Reader::new(&body)).unwrap();
        assert_eq!(trun.composition_time_offset(0), Some(4_294_967_295));

        let body = make_body(1, flags, &[[0, 0, 0, 0xFFFF_FFFF]]);
        let trun = TrunBox::parse(&mut Reader::new(&body)).unwrap();
        assert_eq!(trun.composition_time_offset(0), Some(-1));

        assert_eq!(trun.composition_time_offset(1), None);
    }

    #[test]
    fn test_rejects_unknown_version() {
        let body = make_body(2, 0, &[]);
        assert!(TrunBox::parse(&mut Reader::new(&body)).is_err());
    }

    #[test]
    fn test_truncated_sample_run_fails() {
        let flags = TrunBox::SAMPLE_DURATION_PRESENT | TrunBox::SAMPLE_SIZE_PRESENT;
        let mut body = make_body(0, flags, &[[100, 1000, 0, 0], [200, 2000, 0, 0]]);
        body.truncate(body.len() - 2);
        assert!(TrunBox::parse(&mut Reader::new(&body)).is_err());
    }

    #[test]
    fn test_absurd_sample_count_fails_without_reserving() {
        let mut body = vec![0, 0, 0x02, 0];
        body.extend_from_slice(&u32::MAX.to_be_bytes());
        assert!(TrunBox::parse(&mut Reader::new(&body)).is_err());
    }

    #[test]
    fn test_sample_flags_accessors() {
        let flags = SampleFlags(
            2 << 26 | 1 << 24 | 3 << 22 | 1 << 20 | 5 << 17 | 1 << 16 | 0xBEEF,
        );

        assert_eq!(flags.is_leading(), 2);
        assert_eq!(flags.depends_on(), 1);
        assert_eq!(flags.is_depended_on(), 3);
        assert_eq!(flags.has_redundancy(), 1);
        assert_eq!(flags.padding_value(), 5);
        assert!(flags.is_non_sync_sample());
        assert_eq!(flags.degradation_priority(), 0xBEEF);

        assert!(!SampleFlags(0).is_non_sync_sample());
        assert_eq!(SampleFlags(0).depends_on(), 0);
    }
}
