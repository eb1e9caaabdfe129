//! The archive operations: create, append, list, extract and update.
//!
//! Each call opens what it needs, runs to completion, and releases every file
//! handle before returning, on success and on error alike.

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use crate::block::BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::file::reader::TarReader;
#[cfg(feature = "writer")]
use crate::file::writer::TarWriter;
use crate::record::EntryInfo;

/// Options that change how entries are read back out of an archive.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Reject any header whose checksum does not match its contents.
    pub verify_checksums: bool,
}

/// Write a new archive at `archive` holding `files` in order, replacing any existing file.
#[cfg(feature = "writer")]
pub fn create<A: AsRef<Path>, F: AsRef<Path>>(archive: A, files: &[F]) -> Result<()> {
    let archive = archive.as_ref();
    tracing::info!(archive = %archive.display(), files = files.len(), "creating archive");

    let writer = TarWriter::create(archive)?;
    write_entries(writer, files)
}

/// Add `files` after the last entry of the existing archive at `archive`.
#[cfg(feature = "writer")]
pub fn append<A: AsRef<Path>, F: AsRef<Path>>(archive: A, files: &[F]) -> Result<()> {
    let archive = archive.as_ref();
    tracing::info!(archive = %archive.display(), files = files.len(), "appending to archive");

    let writer = TarWriter::open_append(archive)?;
    write_entries(writer, files)
}

#[cfg(feature = "writer")]
fn write_entries<F: AsRef<Path>>(mut writer: TarWriter, files: &[F]) -> Result<()> {
    for file in files {
        writer.append_file(file)?;
    }

    let len = writer.finish()?;
    tracing::info!(entries = files.len(), bytes = len, "archive written");
    Ok(())
}

/// Names of every entry in archive order, duplicates included.
pub fn list<A: AsRef<Path>>(archive: A) -> Result<Vec<String>> {
    let mut names = vec![];
    TarReader::open(archive)?.scan(|entry, _| {
        names.push(entry.name());
        Ok(())
    })?;
    Ok(names)
}

/// Decoded metadata of every entry in archive order.
pub fn list_entries<A: AsRef<Path>>(archive: A) -> Result<Vec<EntryInfo>> {
    let archive = archive.as_ref();
    let mut entries = vec![];
    TarReader::open(archive)?.scan(|entry, _| {
        entries.push(EntryInfo::from_entry(entry, archive)?);
        Ok(())
    })?;
    Ok(entries)
}

/// Extract every entry into the current directory.
pub fn extract<A: AsRef<Path>>(archive: A) -> Result<()> {
    extract_to(archive, ".")
}

/// Extract every entry below `dest`.
pub fn extract_to<A: AsRef<Path>, D: AsRef<Path>>(archive: A, dest: D) -> Result<()> {
    extract_with_options(archive, dest, ExtractOptions::default()).map(|_| ())
}

/// Extract every entry below `dest`, returning the paths written in archive order.
///
/// Existing files are overwritten, so when a name occurs more than once the
/// last occurrence is what ends up on disk.
///
/// Directories are not created. An entry such as `src/a.txt` fails with
/// [`Error::CreateFile`] unless `dest/src` already exists.
pub fn extract_with_options<A: AsRef<Path>, D: AsRef<Path>>(
    archive: A,
    dest: D,
    options: ExtractOptions,
) -> Result<Vec<PathBuf>> {
    let archive = archive.as_ref();
    let dest = dest.as_ref();
    tracing::info!(
        archive = %archive.display(),
        dest = %dest.display(),
        "extracting archive"
    );

    let mut reader = TarReader::open(archive)?;
    reader.set_verify_checksums(options.verify_checksums);

    let mut written = vec![];
    reader.scan(|entry, payload| {
        let name = entry.entry_name();
        let relative = name.to_relative_path().map_err(|source| Error::InvalidPath {
            path: name.as_path().to_path_buf(),
            source,
        })?;
        let out_path = dest.join(relative);

        let out_file = File::create(&out_path).map_err(|source| Error::CreateFile {
            path: out_path.clone(),
            source,
        })?;
        let mut out_file = BufWriter::new(out_file);

        let mut buf = [0u8; BLOCK_SIZE];
        let mut remaining = entry.size;
        while remaining > 0 {
            let n = payload.read(&mut buf).map_err(|source| Error::ReadArchive {
                path: archive.to_path_buf(),
                offset: entry.data_offset + (entry.size - remaining),
                source,
            })?;
            if n == 0 {
                return Err(Error::TruncatedArchive {
                    path: archive.to_path_buf(),
                    offset: entry.data_offset + (entry.size - remaining),
                });
            }
            out_file
                .write_all(&buf[..n])
                .map_err(|source| Error::WriteFile {
                    path: out_path.clone(),
                    source,
                })?;
            remaining -= n as u64;
        }

        out_file.flush().map_err(|source| Error::WriteFile {
            path: out_path.clone(),
            source,
        })?;

        tracing::debug!(name = %name, path = %out_path.display(), size = entry.size, "extracted entry");
        written.push(out_path);
        Ok(())
    })?;

    tracing::info!(entries = written.len(), "archive extracted");
    Ok(written)
}

/// Re-add `files` that are already members of the archive.
///
/// Every candidate must already be in the archive or nothing is written. The
/// new copies go after the existing entries; earlier copies stay in place.
#[cfg(feature = "writer")]
pub fn update<A: AsRef<Path>, F: AsRef<Path>>(archive: A, files: &[F]) -> Result<()> {
    let archive = archive.as_ref();
    tracing::info!(archive = %archive.display(), files = files.len(), "updating archive");

    use crate::path::EntryName;

    let mut members = std::collections::HashSet::new();
    TarReader::open(archive)?.scan(|entry, _| {
        members.insert(entry.name_bytes().to_vec());
        Ok(())
    })?;

    for file in files {
        let file = file.as_ref();
        let name = EntryName::new(file).map_err(|source| Error::InvalidPath {
            path: file.to_path_buf(),
            source,
        })?;
        if !members.contains(name.as_bytes()) {
            return Err(Error::NotSubset {
                path: archive.to_path_buf(),
                name: name.to_string(),
            });
        }
    }

    append(archive, files)
}

/// Scan the whole archive checking every header checksum. Returns the number of entries.
pub fn validate<A: AsRef<Path>>(archive: A) -> Result<usize> {
    let mut reader = TarReader::open(archive)?;
    reader.set_verify_checksums(true);

    let mut count = 0;
    reader.scan(|_, _| {
        count += 1;
        Ok(())
    })?;
    Ok(count)
}
