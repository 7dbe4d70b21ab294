// ---------------------------------------------------------------------------
// file_header – settings file header with magic bytes, version and checksum
// ---------------------------------------------------------------------------
//
// Header format (16 bytes, fixed-size, little-endian):
//   [0..4]   Magic bytes: "MCUS"
//   [4..8]   Format version (u32)
//   [8..12]  Payload length (u32)
//   [12..16] xxHash32 checksum of the payload
//
// On write: encode payload -> prepend header
// On read:  check magic -> check version -> check length -> check checksum

use xxhash_rust::xxh32::xxh32;

use crate::save_error::SaveError;

/// Magic bytes identifying a unit settings file.
pub const MAGIC: [u8; 4] = *b"MCUS";

pub const HEADER_SIZE: usize = 16;

/// Bumped whenever the header layout changes.
pub const HEADER_FORMAT_VERSION: u32 = 1;

const XXHASH_SEED: u32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub format_version: u32,
    pub payload_len: u32,
    pub checksum: u32,
}

impl FileHeader {
    pub fn new(payload: &[u8]) -> Self {
        Self {
            format_version: HEADER_FORMAT_VERSION,
            payload_len: payload.len() as u32,
            checksum: xxh32(payload, XXHASH_SEED),
        }
    }
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Returns `[header] ++ payload`.
pub fn wrap_with_header(payload: &[u8]) -> Vec<u8> {
    let header = FileHeader::new(payload);
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&header.format_version.to_le_bytes());
    out.extend_from_slice(&header.payload_len.to_le_bytes());
    out.extend_from_slice(&header.checksum.to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Validates the header and returns it with the payload it covers.
///
/// Bytes past the announced payload length are ignored.
pub fn unwrap_header(bytes: &[u8]) -> Result<(FileHeader, &[u8]), SaveError> {
    if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
        return Err(SaveError::BadMagic);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::Truncated {
            len: bytes.len(),
            need: HEADER_SIZE,
        });
    }

    let header = FileHeader {
        format_version: read_u32(bytes, 4),
        payload_len: read_u32(bytes, 8),
        checksum: read_u32(bytes, 12),
    };
    if header.format_version > HEADER_FORMAT_VERSION {
        return Err(SaveError::VersionMismatch {
            expected_max: HEADER_FORMAT_VERSION,
            found: header.format_version,
        });
    }

    let end = HEADER_SIZE + header.payload_len as usize;
    if bytes.len() < end {
        return Err(SaveError::Truncated {
            len: bytes.len(),
            need: end,
        });
    }
    let payload = &bytes[HEADER_SIZE..end];

    let computed = xxh32(payload, XXHASH_SEED);
    if computed != header.checksum {
        return Err(SaveError::ChecksumMismatch {
            expected: header.checksum,
            found: computed,
        });
    }
    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_then_unwrap_returns_payload() {
        let wrapped = wrap_with_header(b"settings");
        assert_eq!(&wrapped[..4], b"MCUS");
        assert_eq!(wrapped.len(), HEADER_SIZE + 8);

        let (header, payload) = unwrap_header(&wrapped).expect("valid file");
        assert_eq!(header.format_version, HEADER_FORMAT_VERSION);
        assert_eq!(header.payload_len, 8);
        assert_eq!(payload, b"settings");
    }

    #[test]
    fn test_foreign_file_rejected() {
        let result = unwrap_header(b"MEGA\x01\x00\x00\x00");
        assert!(matches!(result, Err(SaveError::BadMagic)));
        assert!(matches!(unwrap_header(b""), Err(SaveError::BadMagic)));
    }

    #[test]
    fn test_short_header_rejected() {
        let result = unwrap_header(b"MCUS\x01\x00");
        assert!(matches!(
            result,
            Err(SaveError::Truncated { len: 6, need: 16 })
        ));
    }

    #[test]
    fn test_missing_payload_bytes_rejected() {
        let wrapped = wrap_with_header(b"0123456789");
        let result = unwrap_header(&wrapped[..HEADER_SIZE + 4]);
        assert!(matches!(result, Err(SaveError::Truncated { .. })));
    }

    #[test]
    fn test_flipped_payload_bit_detected() {
        let mut wrapped = wrap_with_header(b"payload");
        let last = wrapped.len() - 1;
        wrapped[last] ^= 0x01;
        assert!(matches!(
            unwrap_header(&wrapped),
            Err(SaveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_future_version_rejected() {
        let mut wrapped = wrap_with_header(b"payload");
        wrapped[4..8].copy_from_slice(&9u32.to_le_bytes());
        assert!(matches!(
            unwrap_header(&wrapped),
            Err(SaveError::VersionMismatch { found: 9, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let mut wrapped = wrap_with_header(b"abc");
        wrapped.extend_from_slice(b"junk");
        let (_, payload) = unwrap_header(&wrapped).expect("valid prefix");
        assert_eq!(payload, b"abc");
    }
}
