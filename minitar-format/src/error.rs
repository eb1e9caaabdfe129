use std::path::PathBuf;

use crate::path::IntoEntryNameError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot stat file `{}`", .path.display())]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot look up owner name of file `{}` (uid {uid})", .path.display())]
    OwnerLookup { path: PathBuf, uid: u32 },

    #[error("Cannot look up group name of file `{}` (gid {gid})", .path.display())]
    GroupLookup { path: PathBuf, gid: u32 },

    #[error("Not a regular file: `{}`", .path.display())]
    NotRegularFile { path: PathBuf },

    #[error("Value {value} of field `{field}` does not fit in the header for `{}`", .path.display())]
    FieldOverflow {
        path: PathBuf,
        field: &'static str,
        value: u64,
    },

    #[error("Cannot handle path `{}`", .path.display())]
    InvalidPath {
        path: PathBuf,
        #[source]
        source: IntoEntryNameError,
    },

    #[error("Archive does not exist: `{}`", .path.display())]
    MissingArchive { path: PathBuf },

    #[error("Cannot open archive `{}`", .path.display())]
    OpenArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create archive `{}`", .path.display())]
    CreateArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read archive `{}` at offset {offset:#x}", .path.display())]
    ReadArchive {
        path: PathBuf,
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write archive `{}`", .path.display())]
    WriteArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot remove footer from archive `{}`", .path.display())]
    TruncateArchive {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open file `{}`", .path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read file `{}`", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot create file `{}`", .path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write file `{}`", .path.display())]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed `{field}` field {value:?} in header at offset {offset:#x} of `{}`", .path.display())]
    MalformedHeader {
        path: PathBuf,
        offset: u64,
        field: &'static str,
        value: String,
    },

    #[error("Archive `{}` ends unexpectedly at offset {offset:#x}", .path.display())]
    TruncatedArchive { path: PathBuf, offset: u64 },

    #[error("Header checksum mismatch at offset {offset:#x} of `{}`: stored {stored:o}, computed {computed:o}", .path.display())]
    ChecksumMismatch {
        path: PathBuf,
        offset: u64,
        stored: u32,
        computed: u32,
    },

    #[error("`{name}` is not a member of archive `{}`", .path.display())]
    NotSubset { path: PathBuf, name: String },
}
