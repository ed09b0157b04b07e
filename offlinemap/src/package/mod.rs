//! Single-file tile package container.
//!
//! An exported offline cache is one package file holding every tile of the
//! export. Tiles are opaque byte blobs; this module only stores and indexes
//! them and never decodes tile contents.
//!
//! # File Layout
//!
//! ```text
//! ┌──────────────┬──────────────────────────────────────────────────┐
//! │ magic (8 B)  │ gzip stream                                      │
//! │ "OMVTPK01"   │  ├── Record::Header(PackageHeader)               │
//! │              │  ├── Record::Tile(TileEntry) × N                 │
//! │              │  └── Record::Footer { tile_count, sha256 }       │
//! └──────────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! Records are bincode-encoded. The footer digest covers every tile's
//! coordinate and payload in write order, so a truncated or partially written
//! package fails to open.
//!
//! # Example
//!
//! ```ignore
//! use offlinemap::package::{PackageHeader, TilePackage, TilePackageWriter};
//!
//! let mut writer = TilePackageWriter::create(&path, header)?;
//! writer.add_tile(TileCoord::new(0, 0, 0), &bytes)?;
//! let summary = writer.finish()?;
//!
//! let package = TilePackage::open(&path)?;
//! assert_eq!(package.tile_count(), summary.tile_count);
//! ```

mod reader;
mod types;
mod writer;

pub use reader::TilePackage;
pub use types::{PackageError, PackageHeader, PackageResult, PackageSummary, PACKAGE_MAGIC};
pub use writer::TilePackageWriter;
