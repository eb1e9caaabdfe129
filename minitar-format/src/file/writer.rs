use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::block::{self, CopyError, BLOCK_SIZE};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::path::EntryName;

/// Sequentially appends entries to an archive.
///
/// Nothing is rolled back on failure: a writer that errors part way leaves a
/// partial archive behind, and only [`TarWriter::finish`] writes the footer.
#[derive(Debug)]
pub struct TarWriter {
    pub(crate) file: BufWriter<File>,
    pub(crate) path: PathBuf,
    pub(crate) position: u64,
    pub(crate) entries: usize,
}

impl TarWriter {
    /// Create `path`, truncating any existing file.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<TarWriter> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| Error::CreateArchive {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "created archive");

        Ok(TarWriter {
            file: BufWriter::new(file),
            path: path.to_path_buf(),
            position: 0,
            entries: 0,
        })
    }

    /// Open an existing archive and strip its footer so entries can follow the last one.
    pub fn open_append<P: AsRef<Path>>(path: P) -> Result<TarWriter> {
        let path = path.as_ref();
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
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

        let truncate_err = |source| Error::TruncateArchive {
            path: path.to_path_buf(),
            source,
        };
        let len = block::remove_footer(&file).map_err(truncate_err)?;
        let position = file.seek(SeekFrom::End(0)).map_err(truncate_err)?;
        debug_assert_eq!(len, position);

        tracing::debug!(
            path = %path.display(),
            offset = format_args!("{:#x}", position),
            "opened archive for appending"
        );

        Ok(TarWriter {
            file: BufWriter::new(file),
            path: path.to_path_buf(),
            position,
            entries: 0,
        })
    }

    #[inline(always)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries written by this writer.
    #[inline(always)]
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Append the file at `source`, named in the archive by the path exactly as given.
    pub fn append_file<P: AsRef<Path>>(&mut self, source: P) -> Result<()> {
        let source = source.as_ref();
        let name = EntryName::new(source).map_err(|e| Error::InvalidPath {
            path: source.to_path_buf(),
            source: e,
        })?;
        self.append_file_as(source, &name)
    }

    /// Append the file at `source` under an explicit entry `name`.
    pub fn append_file_as<P: AsRef<Path>>(&mut self, source: P, name: &EntryName) -> Result<()> {
        let source = source.as_ref();
        let header = Header::for_file(source, name)?;
        // `for_file` only produces sizes it could encode
        let size = header.size().unwrap_or_default();

        let mut input = File::open(source).map_err(|e| Error::OpenFile {
            path: source.to_path_buf(),
            source: e,
        })?;

        let offset = self.position;
        block::write_block(&mut self.file, header.as_bytes()).map_err(|e| self.write_err(e))?;
        self.position += BLOCK_SIZE as u64;

        block::copy_payload(&mut input, &mut self.file, size).map_err(|e| match e {
            CopyError::Read(e) => Error::ReadFile {
                path: source.to_path_buf(),
                source: e,
            },
            CopyError::Write(e) => self.write_err(e),
        })?;
        self.position += block::padded_len(size);
        self.entries += 1;

        tracing::debug!(
            name = %name,
            size,
            offset = format_args!("{:#x}", offset),
            "wrote entry"
        );

        Ok(())
    }

    /// Write the footer and flush, returning the final archive length.
    pub fn finish(mut self) -> Result<u64> {
        block::write_footer(&mut self.file).map_err(|e| self.write_err(e))?;
        self.position += block::FOOTER_SIZE;
        self.file.flush().map_err(|e| self.write_err(e))?;

        tracing::debug!(
            path = %self.path.display(),
            entries = self.entries,
            bytes = self.position,
            "finished archive"
        );

        Ok(self.position)
    }

    fn write_err(&self, source: std::io::Error) -> Error {
        Error::WriteArchive {
            path: self.path.clone(),
            source,
        }
    }
}
