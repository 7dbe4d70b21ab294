//! Encoding of the per-save metadata dictionary.
//!
//! The host stores the bytes alongside its own save data and hands them back
//! before the unit array is deserialised.

use std::collections::BTreeMap;

use units::metadata::SimulationMetaData;

/// Key the dictionary is logged under when it fails to decode.
const METADATA_KEY: &str = "SimulationMetaData::mod_override";

pub fn encode_metadata(metadata: &SimulationMetaData) -> Vec<u8> {
    bitcode::encode(&metadata.overrides())
}

/// Decodes save metadata. Undecodable bytes load as an empty dictionary,
/// which reads as a save written without the expanded array.
pub fn decode_metadata(bytes: &[u8]) -> SimulationMetaData {
    let overrides: BTreeMap<String, bool> = units::decode_or_warn(METADATA_KEY, bytes);
    SimulationMetaData::from_overrides(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expanded_flag_survives_encoding() {
        let metadata = SimulationMetaData::default();
        metadata.mark_expanded();
        metadata.set_flag("other-plugin", false);

        let decoded = decode_metadata(&encode_metadata(&metadata));
        assert!(decoded.loading_expanded());
        assert_eq!(decoded.overrides().len(), 2);
        assert!(!decoded.flag("other-plugin"));
    }

    #[test]
    fn test_missing_metadata_reads_as_original_save() {
        let decoded = decode_metadata(&[]);
        assert!(!decoded.loading_expanded());
        assert!(decoded.overrides().is_empty());
    }

    #[test]
    fn test_empty_dictionary() {
        let decoded = decode_metadata(&encode_metadata(&SimulationMetaData::default()));
        assert!(decoded.overrides().is_empty());
    }
}
