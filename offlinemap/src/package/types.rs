//! Package records and errors

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::coord::TileCoord;
use crate::region::NormalizedRegion;

/// Bytes at the start of every package file.
pub const PACKAGE_MAGIC: &[u8; 8] = b"OMVTPK01";

/// Current record format version.
pub const FORMAT_VERSION: u32 = 1;

/// Result type for package operations.
pub type PackageResult<T> = Result<T, PackageError>;

/// Errors that can occur reading or writing a tile package.
#[derive(Debug, Error)]
pub enum PackageError {
    /// I/O error on the package file.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record could not be encoded.
    #[error("Failed to encode package record: {0}")]
    Encode(String),

    /// A record could not be decoded.
    #[error("Failed to decode package {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    /// The package decoded but failed validation.
    #[error("Package {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl PackageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Descriptive header written first in every package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageHeader {
    /// Record format version.
    pub format_version: u32,
    /// Service the tiles were exported from.
    pub source: String,
    /// Area covered by the export.
    pub region: NormalizedRegion,
    /// Shallowest level of detail included.
    pub min_zoom: u8,
    /// Deepest level of detail included.
    pub max_zoom: u8,
    /// Unix timestamp (seconds) when the export started.
    pub created_at: i64,
}

impl PackageHeader {
    /// Creates a header stamped with the current time.
    pub fn new(source: impl Into<String>, region: NormalizedRegion, min_zoom: u8, max_zoom: u8) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            source: source.into(),
            region,
            min_zoom,
            max_zoom,
            created_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// A single stored tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TileEntry {
    pub coord: TileCoord,
    pub data: Vec<u8>,
}

/// One record in the package stream.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) enum Record {
    Header(PackageHeader),
    Tile(TileEntry),
    Footer { tile_count: u64, sha256: [u8; 32] },
}

/// Outcome of writing or validating a package.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageSummary {
    /// Number of tiles stored.
    pub tile_count: u64,
    /// Sum of tile payload sizes in bytes.
    pub payload_bytes: u64,
    /// Hex-encoded SHA-256 over all tiles.
    pub digest: String,
}

/// Feeds a tile into the running package digest.
pub(crate) fn digest_tile(hasher: &mut Sha256, coord: &TileCoord, data: &[u8]) {
    hasher.update([coord.zoom]);
    hasher.update(coord.row.to_le_bytes());
    hasher.update(coord.col.to_le_bytes());
    hasher.update((data.len() as u64).to_le_bytes());
    hasher.update(data);
}

pub(crate) fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
