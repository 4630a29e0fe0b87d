//! Byte level box builders shared by the integration tests.

/// Wraps `body` in a box with a plain 32-bit size header.
pub fn make_box(fourcc: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut data = ((body.len() + 8) as u32).to_be_bytes().to_vec();
    data.extend_from_slice(fourcc);
    data.extend_from_slice(body);
    data
}

/// Wraps `body` in a full box, prefixing the version byte and a 24-bit
/// big-endian flags field.
pub fn make_full_box(fourcc: &[u8; 4], version: u8, flags: u32, body: &[u8]) -> Vec<u8> {
    let mut full_body = vec![version, (flags >> 16) as u8, (flags >> 8) as u8, flags as u8];
    full_body.extend_from_slice(body);
    make_box(fourcc, &full_body)
}
