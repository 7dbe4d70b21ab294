// ---------------------------------------------------------------------------
// SaveError: errors from reading and writing persisted plugin state
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while persisting settings or save metadata.
#[derive(Debug)]
pub enum SaveError {
    /// I/O error (permission denied, disk full, etc.)
    Io(std::io::Error),
    /// Bitcode decoding failed (corrupt or foreign payload).
    Decode(String),
    /// The file does not start with the expected magic bytes.
    BadMagic,
    /// The file ends before the header or the payload it announces.
    Truncated { len: usize, need: usize },
    /// File written by a newer build.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Payload bytes do not hash to the stored checksum.
    ChecksumMismatch { expected: u32, found: u32 },
}

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "I/O error: {e}"),
            SaveError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            SaveError::BadMagic => write!(f, "Not a settings file: magic bytes missing"),
            SaveError::Truncated { len, need } => {
                write!(f, "File truncated: {len} bytes, need at least {need}")
            }
            SaveError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: file is v{found}, but this build only supports up to v{expected_max}"
            ),
            SaveError::ChecksumMismatch { expected, found } => write!(
                f,
                "Checksum mismatch (expected {expected:#010X}, got {found:#010X})"
            ),
        }
    }
}

impl std::error::Error for SaveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SaveError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<bitcode::Error> for SaveError {
    fn from(e: bitcode::Error) -> Self {
        SaveError::Decode(e.to_string())
    }
}
