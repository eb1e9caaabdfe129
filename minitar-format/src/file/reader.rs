use std::fs::{File, OpenOptions};
use std::io::{BufReader, ErrorKind, Read, Seek, SeekFrom, Take};
use std::path::{Path, PathBuf};

use crate::block::{self, BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::header::{Header, MalformedField};
use crate::path::EntryName;

/// An entry as met during a scan.
#[derive(Debug, Clone)]
pub struct Entry {
    pub header: Header,

    /// Decoded payload length, excluding padding.
    pub size: u64,

    /// Offset of the header block within the archive.
    pub header_offset: u64,

    /// Offset of the first payload byte; the stream position when the entry is visited.
    pub data_offset: u64,
}

impl Entry {
    #[inline(always)]
    pub fn name_bytes(&self) -> &[u8] {
        self.header.name_bytes()
    }

    #[inline(always)]
    pub fn entry_name(&self) -> EntryName {
        EntryName(self.name_bytes().to_vec())
    }

    #[inline(always)]
    pub fn name(&self) -> String {
        self.header.name().into_owned()
    }
}

/// Walks an archive header by header without building an index.
#[derive(Debug)]
pub struct TarReader<R> {
    pub(crate) inner: R,
    pub(crate) path: PathBuf,
    pub(crate) position: u64,
    pub(crate) verify_checksums: bool,
}

impl TarReader<BufReader<File>> {
    /// Open an existing archive for scanning.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<TarReader<BufReader<File>>> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .open(path)
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound => Error::MissingArchive {
                    path: path.to_path_buf(),
                },
                _ => Error::OpenArchive {
                    path: path.to_path_buf(),
                    source,
                },
            })?;

        Ok(TarReader::new(BufReader::new(file), path))
    }
}

impl<R: Read + Seek> TarReader<R> {
    /// Scan `inner`, using `path` to label errors.
    pub fn new<P: Into<PathBuf>>(inner: R, path: P) -> TarReader<R> {
        TarReader {
            inner,
            path: path.into(),
            position: 0,
            verify_checksums: false,
        }
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reject headers whose stored checksum does not match their contents.
    pub fn set_verify_checksums(&mut self, verify: bool) {
        self.verify_checksums = verify;
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Visit every entry in archive order.
    ///
    /// The visitor receives the entry and a reader limited to its payload. It
    /// may read as much of the payload as it likes; whatever it leaves, and the
    /// padding after it, is skipped before the next header is read. The scan
    /// ends at the first header with an empty name. Running out of archive
    /// before that header is [`Error::TruncatedArchive`].
    pub fn scan<F>(&mut self, mut visitor: F) -> Result<()>
    where
        F: FnMut(&Entry, &mut Take<&mut R>) -> Result<()>,
    {
        loop {
            let header_offset = self.position;
            let header = match self.read_header()? {
                Some(header) => header,
                None => {
                    tracing::debug!(
                        offset = format_args!("{:#x}", header_offset),
                        "reached end of archive"
                    );
                    return Ok(());
                }
            };

            let size = header
                .size()
                .map_err(|field| self.malformed(header_offset, field))?;

            let entry = Entry {
                header,
                size,
                header_offset,
                data_offset: self.position,
            };

            tracing::debug!(
                name = %entry.header.name(),
                size,
                offset = format_args!("{:#x}", header_offset),
                "decoded header"
            );

            let mut payload = (&mut self.inner).take(size);
            visitor(&entry, &mut payload)?;
            let unread = payload.limit();

            let skip = unread + block::padding_for(size);
            if skip > 0 {
                self.inner
                    .seek(SeekFrom::Current(skip as i64))
                    .map_err(|source| Error::ReadArchive {
                        path: self.path.clone(),
                        offset: self.position,
                        source,
                    })?;
            }
            self.position = entry.data_offset + block::padded_len(size);
        }
    }

    /// Read the next header block, or `None` at the logical end of the archive.
    fn read_header(&mut self) -> Result<Option<Header>> {
        let mut buf = [0u8; BLOCK_SIZE];
        let n = block::read_block(&mut self.inner, &mut buf).map_err(|source| {
            Error::ReadArchive {
                path: self.path.clone(),
                offset: self.position,
                source,
            }
        })?;

        if n < BLOCK_SIZE {
            return Err(Error::TruncatedArchive {
                path: self.path.clone(),
                offset: self.position + n as u64,
            });
        }

        let header = Header::from_bytes(buf);
        if header.is_end_marker() {
            return Ok(None);
        }

        if self.verify_checksums {
            let mismatch = header
                .checksum_mismatch()
                .map_err(|field| self.malformed(self.position, field))?;
            if let Some((stored, computed)) = mismatch {
                return Err(Error::ChecksumMismatch {
                    path: self.path.clone(),
                    offset: self.position,
                    stored,
                    computed,
                });
            }
        }

        self.position += BLOCK_SIZE as u64;
        Ok(Some(header))
    }

    fn malformed(&self, offset: u64, field: MalformedField) -> Error {
        Error::MalformedHeader {
            path: self.path.clone(),
            offset,
            field: field.field,
            value: field.value,
        }
    }
}
