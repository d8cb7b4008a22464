//! Framed binary snapshots of a build state.
//!
//! Layout: a 4-byte little-endian header length, the bincode-encoded
//! [`SnapshotHeader`], then the bincode-encoded [`BuildState`]. The header
//! carries magic bytes, a format version and a checksum of the payload.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;
use verdict_common::ContentHash;

use crate::error::SnapshotError;
use crate::state::BuildState;

/// Magic bytes identifying a snapshot.
const SNAPSHOT_MAGIC: [u8; 4] = *b"VRDT";

/// Current snapshot format version. Increment on breaking changes to the
/// header or payload format.
const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Header prepended to every snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    /// Must be `b"VRDT"`.
    pub magic: [u8; 4],
    /// Snapshot format version.
    pub format_version: u32,
    /// Generation of the frozen state.
    pub generation: u64,
    /// Hash of the payload bytes.
    pub checksum: ContentHash,
}

fn serialization(e: impl std::fmt::Display) -> SnapshotError {
    SnapshotError::Serialization {
        reason: e.to_string(),
    }
}

/// Encodes a state into snapshot bytes.
pub fn freeze(state: &BuildState) -> Result<Vec<u8>, SnapshotError> {
    let payload =
        bincode::serde::encode_to_vec(state, bincode::config::standard()).map_err(serialization)?;
    let header = SnapshotHeader {
        magic: SNAPSHOT_MAGIC,
        format_version: SNAPSHOT_FORMAT_VERSION,
        generation: state.generation(),
        checksum: ContentHash::from_bytes(&payload),
    };
    let header_bytes =
        bincode::serde::encode_to_vec(&header, bincode::config::standard()).map_err(serialization)?;

    let header_len = u32::try_from(header_bytes.len()).map_err(serialization)?;
    let mut output = Vec::with_capacity(4 + header_bytes.len() + payload.len());
    output.extend_from_slice(&header_len.to_le_bytes());
    output.extend_from_slice(&header_bytes);
    output.extend_from_slice(&payload);
    Ok(output)
}

/// Decodes snapshot bytes, validating magic, version and checksum.
pub fn thaw(raw: &[u8]) -> Result<BuildState, SnapshotError> {
    let (len_bytes, rest) = raw.split_first_chunk::<4>().ok_or_else(|| SnapshotError::Truncated {
        reason: "missing header length".to_string(),
    })?;
    let header_len = u32::from_le_bytes(*len_bytes) as usize;
    if rest.len() < header_len {
        return Err(SnapshotError::Truncated {
            reason: format!("header needs {header_len} bytes, {} available", rest.len()),
        });
    }
    let (header_bytes, payload) = rest.split_at(header_len);

    let (header, _): (SnapshotHeader, usize) =
        bincode::serde::decode_from_slice(header_bytes, bincode::config::standard())
            .map_err(serialization)?;
    if header.magic != SNAPSHOT_MAGIC {
        return Err(SnapshotError::BadMagic {
            found: header.magic,
        });
    }
    if header.format_version != SNAPSHOT_FORMAT_VERSION {
        return Err(SnapshotError::VersionMismatch {
            expected: SNAPSHOT_FORMAT_VERSION,
            actual: header.format_version,
        });
    }
    let actual = ContentHash::from_bytes(payload);
    if actual != header.checksum {
        return Err(SnapshotError::ChecksumMismatch {
            expected: header.checksum.to_string(),
            actual: actual.to_string(),
        });
    }

    let (state, _): (BuildState, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())
            .map_err(serialization)?;
    debug!(generation = header.generation, "thawed snapshot");
    Ok(state)
}

/// Freezes a state into a file.
pub fn freeze_to_file(state: &BuildState, path: &Path) -> Result<(), SnapshotError> {
    let bytes = freeze(state)?;
    std::fs::write(path, bytes).map_err(|e| SnapshotError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Thaws a state from a file.
pub fn thaw_from_file(path: &Path) -> Result<BuildState, SnapshotError> {
    let raw = std::fs::read(path).map_err(|e| SnapshotError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    thaw(&raw)
}
