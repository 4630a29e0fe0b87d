use crate::{ParseError, Result};

/// Bounds-checked big-endian cursor over a borrowed byte slice.
///
/// Reads never advance past the end of the data: a failed read reports
/// [`ParseError::UnexpectedEnd`] and leaves the position untouched, so a
/// streaming caller can rewind with [`Reader::set_position`] and retry once
/// more bytes have been buffered.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Moves the cursor to `pos`, which must not exceed the data length.
    pub fn set_position(&mut self, pos: usize) {
        debug_assert!(pos <= self.data.len());
        self.pos = pos.min(self.data.len());
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn has_more_data(&self) -> bool {
        self.pos < self.data.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if count > self.remaining() {
            return Err(ParseError::UnexpectedEnd {
                offset: self.pos,
                needed: count,
                available: self.remaining(),
            });
        }

        let bytes = &self.data[self.pos..self.pos + count];
        self.pos += count;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let mut buf = [0; 2];
        buf.copy_from_slice(self.take(2)?);
        Ok(u16::from_be_bytes(buf))
    }

    /// Reads a big-endian 24-bit value, the layout of most full box flags
    /// fields.
    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(u32::from_be_bytes([0, b[0], b[1], b[2]]))
    }

    /// Reads a little-endian 24-bit value. The single known use is the sidx
    /// box-level flags field, which is read in this byte order.
    pub fn read_u24_le(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], 0]))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(u32::from_be_bytes(buf))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let mut buf = [0; 4];
        buf.copy_from_slice(self.take(4)?);
        Ok(i32::from_be_bytes(buf))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let mut buf = [0; 8];
        buf.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    /// Splits off a reader over the next `count` bytes, consuming them from
    /// this one. Used to scope child box bodies during recursive decoding.
    pub fn sub_reader(&mut self, count: usize) -> Result<Reader<'a>> {
        Ok(Reader::new(self.take(count)?))
    }
}
