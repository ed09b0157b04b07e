//! Package reader and validator.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};

use super::types::{
    digest_tile, to_hex, PackageError, PackageHeader, PackageResult, PackageSummary, Record,
    PACKAGE_MAGIC,
};
use crate::coord::TileCoord;

/// An opened, fully validated tile package.
///
/// Opening reads every record, so a package that opens successfully is known
/// to be complete: the footer is present and its tile count and digest match
/// the tiles that precede it.
#[derive(Debug)]
pub struct TilePackage {
    path: PathBuf,
    header: PackageHeader,
    tiles: BTreeMap<TileCoord, Vec<u8>>,
    summary: PackageSummary,
}

impl TilePackage {
    /// Opens and validates a package file.
    pub fn open(path: &Path) -> PackageResult<Self> {
        let file = File::open(path).map_err(|e| PackageError::io(path, e))?;
        let mut reader = BufReader::new(file);

        let mut magic = [0u8; 8];
        reader
            .read_exact(&mut magic)
            .map_err(|_| PackageError::corrupt(path, "file too short for package magic"))?;
        if &magic != PACKAGE_MAGIC {
            return Err(PackageError::corrupt(path, "bad package magic"));
        }

        let mut decoder = GzDecoder::new(reader);

        let header = match read_record(&mut decoder, path)? {
            Record::Header(header) => header,
            _ => return Err(PackageError::corrupt(path, "first record is not a header")),
        };

        let mut hasher = Sha256::new();
        let mut tiles = BTreeMap::new();
        let mut payload_bytes = 0u64;

        loop {
            match read_record(&mut decoder, path)? {
                Record::Tile(entry) => {
                    digest_tile(&mut hasher, &entry.coord, &entry.data);
                    payload_bytes += entry.data.len() as u64;
                    tiles.insert(entry.coord, entry.data);
                }
                Record::Footer { tile_count, sha256 } => {
                    let mut actual = [0u8; 32];
                    actual.copy_from_slice(&hasher.finalize());
                    if actual != sha256 {
                        return Err(PackageError::corrupt(path, "tile digest mismatch"));
                    }
                    if tile_count != tiles.len() as u64 {
                        return Err(PackageError::corrupt(
                            path,
                            format!(
                                "footer records {} tiles, found {}",
                                tile_count,
                                tiles.len()
                            ),
                        ));
                    }
                    let summary = PackageSummary {
                        tile_count,
                        payload_bytes,
                        digest: to_hex(&actual),
                    };
                    return Ok(Self {
                        path: path.to_path_buf(),
                        header,
                        tiles,
                        summary,
                    });
                }
                Record::Header(_) => {
                    return Err(PackageError::corrupt(path, "unexpected second header"));
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &PackageHeader {
        &self.header
    }

    pub fn summary(&self) -> &PackageSummary {
        &self.summary
    }

    pub fn tile_count(&self) -> u64 {
        self.summary.tile_count
    }

    /// Looks up a tile's payload.
    pub fn tile(&self, coord: &TileCoord) -> Option<&[u8]> {
        self.tiles.get(coord).map(Vec::as_slice)
    }

    /// Iterates stored tile coordinates in (zoom, row, col) order.
    pub fn coords(&self) -> impl Iterator<Item = &TileCoord> {
        self.tiles.keys()
    }
}

fn read_record<R: Read>(reader: &mut R, path: &Path) -> PackageResult<Record> {
    bincode::deserialize_from(reader).map_err(|e| PackageError::Decode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::TilePackageWriter;
    use crate::region::{normalize_central_meridian, Extent, Region};
    use std::fs;
    use tempfile::TempDir;

    fn header() -> PackageHeader {
        let region = Region::new(Extent::new(0.0, 0.0, 10.0, 10.0), 1_000.0);
        PackageHeader::new("test://tiles", normalize_central_meridian(&region), 0, 2)
    }

    fn write_sample(path: &Path) -> PackageSummary {
        let mut writer = TilePackageWriter::create(path, header()).unwrap();
        writer.add_tile(TileCoord::new(0, 0, 0), b"world").unwrap();
        writer.add_tile(TileCoord::new(1, 0, 1), b"north-east").unwrap();
        writer.add_tile(TileCoord::new(2, 1, 2), &[0u8; 512]).unwrap();
        writer.finish().unwrap()
    }

    #[test]
    fn test_open_written_package() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tiles.vtpk");
        let summary = write_sample(&path);

        let package = TilePackage::open(&path).unwrap();

        assert_eq!(summary.tile_count, 3);
        assert_eq!(package.summary(), &summary);
        assert_eq!(package.header().source, "test://tiles");
        assert_eq!(package.tile(&TileCoord::new(1, 0, 1)), Some(&b"north-east"[..]));
        assert_eq!(package.tile(&TileCoord::new(5, 0, 0)), None);
        assert_eq!(package.coords().count(), 3);
    }

    #[test]
    fn test_unfinished_package_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("partial.vtpk");

        {
            let mut writer = TilePackageWriter::create(&path, header()).unwrap();
            writer.add_tile(TileCoord::new(0, 0, 0), b"world").unwrap();
            // Dropped without finish()
        }

        assert!(TilePackage::open(&path).is_err());
    }

    #[test]
    fn test_bad_magic_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bogus.vtpk");
        fs::write(&path, b"not a package at all").unwrap();

        let err = TilePackage::open(&path).unwrap_err();
        assert!(matches!(err, PackageError::Corrupt { .. }));
    }

    #[test]
    fn test_truncated_package_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("tiles.vtpk");
        write_sample(&path);

        let bytes = fs::read(&path).unwrap();
        fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

        assert!(TilePackage::open(&path).is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = TilePackage::open(&temp.path().join("absent.vtpk")).unwrap_err();
        assert!(matches!(err, PackageError::Io { .. }));
    }

    #[test]
    fn test_empty_package_is_valid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.vtpk");
        let summary = TilePackageWriter::create(&path, header())
            .unwrap()
            .finish()
            .unwrap();

        let package = TilePackage::open(&path).unwrap();
        assert_eq!(summary.tile_count, 0);
        assert_eq!(package.tile_count(), 0);
    }
}
