//! Reading and writing of POSIX ustar archives containing regular files.
//!
//! An archive is a flat sequence of 512-byte blocks: each entry is a header
//! block followed by its payload padded to a block boundary, and the whole
//! stream ends with two zeroed blocks. There is no index, so every operation
//! walks the archive from the start.

#[cfg(not(unix))]
compile_error!("minitar-format reads owner and device metadata and only supports unix targets");

pub mod block;
#[cfg(feature = "reader")]
mod engine;
mod error;
mod file;
mod fs;
pub mod header;
pub mod path;
#[cfg(feature = "reader")]
mod record;

#[cfg(feature = "reader")]
pub use engine::*;
pub use error::{Error, Result};
#[cfg(feature = "reader")]
pub use file::reader::{Entry, TarReader};
#[cfg(feature = "writer")]
pub use file::writer::TarWriter;
pub use header::Header;
pub use path::EntryName;
#[cfg(feature = "reader")]
pub use record::EntryInfo;
