//! Error types for the snapshot codec.

use std::path::PathBuf;

/// Errors from freezing or thawing a build state.
///
/// Hosts treat any thaw failure as "no prior state" and run a full build.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Reading or writing a snapshot file failed.
    #[error("snapshot I/O error at {path}: {source}")]
    Io {
        /// The snapshot path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The input is shorter than its framing claims.
    #[error("snapshot truncated: {reason}")]
    Truncated {
        /// What was missing.
        reason: String,
    },

    /// The magic bytes are not `VRDT`.
    #[error("not a snapshot: bad magic bytes {found:?}")]
    BadMagic {
        /// The bytes found instead.
        found: [u8; 4],
    },

    /// The snapshot was written by an incompatible format version.
    #[error("snapshot version mismatch: expected {expected}, got {actual}")]
    VersionMismatch {
        /// The version this build reads.
        expected: u32,
        /// The version in the header.
        actual: u32,
    },

    /// The payload does not match the checksum in the header.
    #[error("snapshot checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch {
        /// Checksum recorded in the header.
        expected: String,
        /// Checksum of the payload read.
        actual: String,
    },

    /// Encoding or decoding the header or payload failed.
    #[error("snapshot serialization error: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },
}
