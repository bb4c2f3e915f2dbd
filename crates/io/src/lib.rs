//! # almanac-io
//!
//! Archive resampled frames to Parquet and read them back.
//!
//! Frames are stored in long format, one row per `(anchor_year, interval)`
//! cell and position along the remaining dimensions:
//!
//! | column | type | content |
//! |--------|------|---------|
//! | `anchor_year` | Int32 | anchor year of the cell |
//! | `interval` | Utf8 | lag label, `t-0`, `t-1`, ... |
//! | `is_target` | Boolean | whether the interval is a target period |
//! | one per non-time dimension | UInt32 | position along that dimension |
//! | one per variable | Float64 | resampled value |
//!
//! Attributes, dimension sizes, coordinates and variable order are kept as
//! JSON in the schema metadata.
//!
//! ```ignore
//! use almanac_io::{Compression, WriterConfig, read_parquet, write_parquet};
//!
//! let config = WriterConfig::new().with_compression(Compression::Zstd(3));
//! write_parquet(path, &frame, &config)?;
//! let restored = read_parquet(path)?;
//! ```

mod error;
mod parquet_read;
mod parquet_write;
mod reader;
mod writer;

pub use error::IoError;
pub use reader::read_parquet;
pub use writer::{Compression, WriterConfig, write_parquet};
