//! On-disk form of [`UnitSettings`].
//!
//! `[file header] ++ bitcode(UnitSettings)`, replaced atomically on write.

use std::path::Path;

use units::UnitSettings;

use crate::atomic_write::atomic_write;
use crate::file_header::{unwrap_header, wrap_with_header};
use crate::save_error::SaveError;

pub fn encode_settings(settings: &UnitSettings) -> Vec<u8> {
    wrap_with_header(&bitcode::encode(settings))
}

pub fn decode_settings(bytes: &[u8]) -> Result<UnitSettings, SaveError> {
    let (_, payload) = unwrap_header(bytes)?;
    Ok(bitcode::decode(payload)?)
}

/// Reads the settings file. `Ok(None)` when there is none yet.
pub fn read_settings(path: &Path) -> Result<Option<UnitSettings>, SaveError> {
    match std::fs::read(path) {
        Ok(bytes) => decode_settings(&bytes).map(Some),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn write_settings(path: &Path, settings: &UnitSettings) -> Result<(), SaveError> {
    atomic_write(path, &encode_settings(settings))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_header::HEADER_SIZE;

    #[test]
    fn test_encoded_settings_decode_back() {
        let settings = UnitSettings {
            double_capacity: false,
            check_on_load: true,
            reset_on_next_load: true,
        };
        let bytes = encode_settings(&settings);
        assert_eq!(decode_settings(&bytes).unwrap(), settings);
    }

    #[test]
    fn test_corrupt_payload_is_an_error() {
        let mut bytes = encode_settings(&UnitSettings::default());
        bytes[HEADER_SIZE] ^= 0xFF;
        assert!(matches!(
            decode_settings(&bytes),
            Err(SaveError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_payload_is_decode_error() {
        let bytes = wrap_with_header(&[]);
        assert!(matches!(decode_settings(&bytes), Err(SaveError::Decode(_))));
    }

    #[test]
    fn test_missing_file_reads_as_none() {
        let path = std::env::temp_dir().join("units_settings_file_missing.cfg");
        let _ = std::fs::remove_file(&path);
        assert!(read_settings(&path).unwrap().is_none());
    }

    #[test]
    fn test_written_file_reads_back() {
        let path = std::env::temp_dir().join("units_settings_file_written.cfg");
        let settings = UnitSettings {
            check_on_load: true,
            ..Default::default()
        };
        write_settings(&path, &settings).unwrap();
        assert_eq!(read_settings(&path).unwrap(), Some(settings));
        let _ = std::fs::remove_file(&path);
    }
}
