//! Versioned pipeline artifact format.
//!
//! Layout:
//! ```text
//! [4-byte magic: "LFBT"]
//! [2-byte format version: u16 little-endian]
//! [4-byte metadata_len: u32 little-endian]
//! [JSON metadata: key-value pairs]
//! [bincode payload: the fitted pipeline]
//! [4-byte CRC32: checksum of all preceding bytes]
//! ```
//!
//! A reader only accepts its own format version; anything else fails
//! fast, it never produces a partially valid pipeline.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{json, Value as JsonValue};

use crate::error::{LifeboatError, Result};
use crate::pipeline::FittedPipeline;

/// Magic bytes opening every artifact.
pub const ARTIFACT_MAGIC: [u8; 4] = *b"LFBT";

/// Format version this build reads and writes.
pub const FORMAT_VERSION: u16 = 1;

/// Header bytes before the metadata section.
const HEADER_LEN: usize = 4 + 2 + 4;

/// Artifact metadata: arbitrary JSON key-value pairs.
pub type ArtifactMetadata = BTreeMap<String, JsonValue>;

/// Serializes a fitted pipeline into artifact bytes.
///
/// # Errors
///
/// Returns an error if the pipeline state fails to serialize.
pub fn to_bytes(pipeline: &FittedPipeline) -> Result<Vec<u8>> {
    let payload = bincode::serialize(pipeline)
        .map_err(|e| LifeboatError::Serialization(e.to_string()))?;

    let metadata = build_metadata(pipeline)?;
    let metadata_json = serde_json::to_vec(&metadata)
        .map_err(|e| LifeboatError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + metadata_json.len() + payload.len() + 4);
    out.extend_from_slice(&ARTIFACT_MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(metadata_json.len() as u32).to_le_bytes());
    out.extend_from_slice(&metadata_json);
    out.extend_from_slice(&payload);

    let crc = crc32(&out);
    out.extend_from_slice(&crc.to_le_bytes());
    Ok(out)
}

/// Parses artifact bytes back into a pipeline and its metadata.
///
/// # Errors
///
/// Fails fast with `Format` on truncation or a bad magic,
/// `UnsupportedVersion` on a version mismatch, `ChecksumMismatch` on
/// corruption, and `Serialization` on an undecodable payload.
pub fn from_bytes(data: &[u8]) -> Result<(FittedPipeline, ArtifactMetadata)> {
    if data.len() < HEADER_LEN + 4 {
        return Err(LifeboatError::Format {
            message: format!("artifact too short: {} bytes", data.len()),
        });
    }

    if data[0..4] != ARTIFACT_MAGIC {
        return Err(LifeboatError::Format {
            message: format!("bad magic: expected \"LFBT\", got {:?}", &data[0..4]),
        });
    }

    let version = u16::from_le_bytes([data[4], data[5]]);
    if version != FORMAT_VERSION {
        return Err(LifeboatError::UnsupportedVersion {
            found: version,
            supported: FORMAT_VERSION,
        });
    }

    let body_len = data.len() - 4;
    let expected = u32::from_le_bytes([
        data[body_len],
        data[body_len + 1],
        data[body_len + 2],
        data[body_len + 3],
    ]);
    let actual = crc32(&data[..body_len]);
    if expected != actual {
        return Err(LifeboatError::ChecksumMismatch { expected, actual });
    }

    let metadata_len = u32::from_le_bytes([data[6], data[7], data[8], data[9]]) as usize;
    if HEADER_LEN + metadata_len > body_len {
        return Err(LifeboatError::Format {
            message: "metadata length exceeds artifact body".to_string(),
        });
    }

    let metadata: ArtifactMetadata = if metadata_len > 0 {
        serde_json::from_slice(&data[HEADER_LEN..HEADER_LEN + metadata_len]).map_err(|e| {
            LifeboatError::Format {
                message: format!("invalid metadata JSON: {e}"),
            }
        })?
    } else {
        BTreeMap::new()
    };

    let payload = &data[HEADER_LEN + metadata_len..body_len];
    let pipeline: FittedPipeline = bincode::deserialize(payload)
        .map_err(|e| LifeboatError::Serialization(e.to_string()))?;

    Ok((pipeline, metadata))
}

/// Writes a fitted pipeline artifact to disk.
///
/// # Errors
///
/// Returns an error on serialization or I/O failure.
pub fn save_pipeline<P: AsRef<Path>>(path: P, pipeline: &FittedPipeline) -> Result<()> {
    let bytes = to_bytes(pipeline)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Loads a fitted pipeline artifact from disk.
///
/// # Errors
///
/// Returns `Io` if the file cannot be read, otherwise the
/// [`from_bytes`] failure modes.
pub fn load_pipeline<P: AsRef<Path>>(path: P) -> Result<(FittedPipeline, ArtifactMetadata)> {
    let data = fs::read(path)?;
    from_bytes(&data)
}

/// Metadata recorded alongside the payload.
pub(crate) fn build_metadata(pipeline: &FittedPipeline) -> Result<ArtifactMetadata> {
    let mut metadata = ArtifactMetadata::new();
    metadata.insert("format".to_string(), json!("lifeboat.survival-pipeline"));
    metadata.insert("format_version".to_string(), json!(FORMAT_VERSION));
    metadata.insert(
        "crate_version".to_string(),
        json!(env!("CARGO_PKG_VERSION")),
    );
    metadata.insert("model".to_string(), json!("gradient-boosting"));
    metadata.insert("n_estimators".to_string(), json!(pipeline.n_estimators()));
    metadata.insert("n_features".to_string(), json!(pipeline.n_features()?));
    metadata.insert(
        "feature_names".to_string(),
        json!(pipeline.feature_names()?),
    );
    Ok(metadata)
}

/// CRC32 checksum (IEEE polynomial) over artifact bytes.
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    const TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ TABLE[idx];
    }
    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_values() {
        // Standard IEEE test vector.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(&[]), 0x0000_0000);
    }

    #[test]
    fn test_from_bytes_too_short() {
        assert!(matches!(
            from_bytes(&[0u8; 5]),
            Err(LifeboatError::Format { .. })
        ));
    }

    #[test]
    fn test_from_bytes_bad_magic() {
        let mut data = vec![0u8; 64];
        data[0..4].copy_from_slice(b"NOPE");
        assert!(matches!(
            from_bytes(&data),
            Err(LifeboatError::Format { .. })
        ));
    }

    #[test]
    fn test_from_bytes_version_gate() {
        // Well-formed header with a future version; the version gate
        // must fire before any payload parsing.
        let mut data = Vec::new();
        data.extend_from_slice(&ARTIFACT_MAGIC);
        data.extend_from_slice(&99u16.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());
        let crc = crc32(&data);
        data.extend_from_slice(&crc.to_le_bytes());

        match from_bytes(&data) {
            Err(LifeboatError::UnsupportedVersion { found, supported }) => {
                assert_eq!(found, 99);
                assert_eq!(supported, FORMAT_VERSION);
            }
            other => panic!("expected UnsupportedVersion, got {other:?}"),
        }
    }
}
