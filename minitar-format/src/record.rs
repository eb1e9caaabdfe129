use crate::error::{Error, Result};
use crate::file::reader::Entry;
use crate::header::MalformedField;

/// Metadata of one archive member, decoded for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// The stored name. Bytes that are not UTF-8 are replaced.
    pub name: String,

    /// The exact length of the payload, ignoring any padding.
    pub size: u64,

    /// Permission bits.
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub username: String,
    pub groupname: String,

    /// Modification time in seconds since the Unix epoch.
    pub mtime: u64,

    /// Offset of the entry's header block in the archive.
    pub offset: u64,
}

impl EntryInfo {
    pub(crate) fn from_entry(entry: &Entry, archive: &std::path::Path) -> Result<EntryInfo> {
        let malformed = |field: MalformedField| Error::MalformedHeader {
            path: archive.to_path_buf(),
            offset: entry.header_offset,
            field: field.field,
            value: field.value,
        };

        let header = &entry.header;
        Ok(EntryInfo {
            name: entry.name(),
            size: entry.size,
            mode: header.mode().map_err(malformed)?,
            uid: header.uid().map_err(malformed)?,
            gid: header.gid().map_err(malformed)?,
            username: header.username().into_owned(),
            groupname: header.groupname().into_owned(),
            mtime: header.mtime().map_err(malformed)?,
            offset: entry.header_offset,
        })
    }
}
