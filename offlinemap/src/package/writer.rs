//! Streaming package writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use super::types::{
    digest_tile, to_hex, PackageError, PackageHeader, PackageResult, PackageSummary, Record,
    TileEntry, PACKAGE_MAGIC,
};
use crate::coord::TileCoord;

/// Writes tiles into a new package file one at a time.
///
/// The file is not a valid package until [`finish`](Self::finish) succeeds;
/// dropping the writer early leaves a file without a footer, which
/// [`TilePackage::open`](super::TilePackage::open) rejects.
pub struct TilePackageWriter {
    path: PathBuf,
    encoder: GzEncoder<BufWriter<File>>,
    hasher: Sha256,
    tile_count: u64,
    payload_bytes: u64,
}

impl TilePackageWriter {
    /// Creates (or truncates) the package file and writes its header.
    pub fn create(path: &Path, header: PackageHeader) -> PackageResult<Self> {
        let file = File::create(path).map_err(|e| PackageError::io(path, e))?;
        let mut buffered = BufWriter::new(file);
        buffered
            .write_all(PACKAGE_MAGIC)
            .map_err(|e| PackageError::io(path, e))?;

        let mut writer = Self {
            path: path.to_path_buf(),
            encoder: GzEncoder::new(buffered, Compression::default()),
            hasher: Sha256::new(),
            tile_count: 0,
            payload_bytes: 0,
        };
        writer.write_record(&Record::Header(header))?;
        Ok(writer)
    }

    /// Appends one tile.
    pub fn add_tile(&mut self, coord: TileCoord, data: &[u8]) -> PackageResult<()> {
        digest_tile(&mut self.hasher, &coord, data);
        self.write_record(&Record::Tile(TileEntry {
            coord,
            data: data.to_vec(),
        }))?;
        self.tile_count += 1;
        self.payload_bytes += data.len() as u64;
        Ok(())
    }

    /// Number of tiles written so far.
    pub fn tile_count(&self) -> u64 {
        self.tile_count
    }

    /// Writes the footer, flushes and syncs the file.
    pub fn finish(mut self) -> PackageResult<PackageSummary> {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&self.hasher.clone().finalize());
        self.write_record(&Record::Footer {
            tile_count: self.tile_count,
            sha256: digest,
        })?;

        let path = self.path;
        let buffered = self
            .encoder
            .finish()
            .map_err(|e| PackageError::io(&path, e))?;
        let file = buffered
            .into_inner()
            .map_err(|e| PackageError::io(&path, e.into_error()))?;
        file.sync_all().map_err(|e| PackageError::io(&path, e))?;

        Ok(PackageSummary {
            tile_count: self.tile_count,
            payload_bytes: self.payload_bytes,
            digest: to_hex(&digest),
        })
    }

    fn write_record(&mut self, record: &Record) -> PackageResult<()> {
        bincode::serialize_into(&mut self.encoder, record)
            .map_err(|e| PackageError::Encode(e.to_string()))
    }
}
