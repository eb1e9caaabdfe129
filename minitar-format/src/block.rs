//! Block-granular I/O over the archive stream.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};

pub const BLOCK_SIZE: usize = 512;
pub const FOOTER_BLOCKS: usize = 2;
pub const FOOTER_SIZE: u64 = (BLOCK_SIZE * FOOTER_BLOCKS) as u64;

const ZERO_BLOCK: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// Which side of a payload copy failed.
#[derive(Debug)]
pub enum CopyError {
    Read(std::io::Error),
    Write(std::io::Error),
}

/// Number of zero bytes needed after `size` bytes to reach a block boundary.
#[inline(always)]
pub fn padding_for(size: u64) -> u64 {
    let block = BLOCK_SIZE as u64;
    (block - size % block) % block
}

/// `size` rounded up to the next multiple of the block size.
#[inline(always)]
pub fn padded_len(size: u64) -> u64 {
    size + padding_for(size)
}

#[inline(always)]
pub fn write_block<W: Write>(writer: &mut W, block: &[u8; BLOCK_SIZE]) -> std::io::Result<()> {
    writer.write_all(block)
}

pub fn write_padding<W: Write>(writer: &mut W, len: usize) -> std::io::Result<()> {
    debug_assert!(len < BLOCK_SIZE);
    writer.write_all(&ZERO_BLOCK[..len])
}

/// Two zeroed blocks, the last bytes of every complete archive.
pub fn write_footer<W: Write>(writer: &mut W) -> std::io::Result<()> {
    for _ in 0..FOOTER_BLOCKS {
        write_block(writer, &ZERO_BLOCK)?;
    }
    Ok(())
}

/// Cut the footer off `file` so new entries can be written where it was.
///
/// Files shorter than a footer are truncated to nothing. Returns the new length.
pub fn remove_footer(file: &File) -> std::io::Result<u64> {
    let len = file.metadata()?.len();
    let new_len = len.saturating_sub(FOOTER_SIZE);
    file.set_len(new_len)?;
    Ok(new_len)
}

/// Fill `buf` from `reader`, stopping early only at end of stream.
pub fn read_block<R: Read>(reader: &mut R, buf: &mut [u8; BLOCK_SIZE]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Copy exactly `len` bytes of payload from `reader` in block-sized chunks,
/// zero-padding the final short chunk up to the block boundary.
///
/// A source that ends before `len` bytes is a read error: the header already
/// promised `len` bytes to whoever reads the archive.
pub fn copy_payload<R: Read, W: Write>(
    reader: &mut R,
    writer: &mut W,
    len: u64,
) -> std::result::Result<u64, CopyError> {
    let mut reader = reader.take(len);
    let mut buf = [0u8; BLOCK_SIZE];
    let mut copied = 0u64;

    loop {
        let n = read_block(&mut reader, &mut buf).map_err(CopyError::Read)?;
        if n == 0 {
            break;
        }

        writer.write_all(&buf[..n]).map_err(CopyError::Write)?;
        copied += n as u64;

        if n < BLOCK_SIZE {
            write_padding(writer, BLOCK_SIZE - n).map_err(CopyError::Write)?;
            break;
        }
    }

    if copied != len {
        return Err(CopyError::Read(std::io::Error::new(
            ErrorKind::UnexpectedEof,
            format!("file ended after {} of {} bytes", copied, len),
        )));
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn padding() {
        assert_eq!(padding_for(0), 0);
        assert_eq!(padding_for(1), 511);
        assert_eq!(padding_for(511), 1);
        assert_eq!(padding_for(512), 0);
        assert_eq!(padding_for(513), 511);
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(5), 512);
        assert_eq!(padded_len(1024), 1024);
        assert_eq!(padded_len(1025), 1536);
    }

    #[test]
    fn footer_is_two_zero_blocks() {
        let mut out = vec![];
        write_footer(&mut out).unwrap();
        assert_eq!(out.len(), 1024);
        assert!(out.iter().all(|b| *b == 0));
    }

    #[test]
    fn copy_pads_short_final_block() {
        let data = vec![7u8; 700];
        let mut out = vec![];
        let copied = copy_payload(&mut Cursor::new(&data), &mut out, 700).unwrap();

        assert_eq!(copied, 700);
        assert_eq!(out.len(), 1024);
        assert_eq!(&out[..700], &data[..]);
        assert!(out[700..].iter().all(|b| *b == 0));
    }

    #[test]
    fn copy_exact_blocks_adds_no_padding() {
        let data = vec![1u8; 1024];
        let mut out = vec![];
        copy_payload(&mut Cursor::new(&data), &mut out, 1024).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn copy_empty_writes_nothing() {
        let mut out = vec![];
        let copied = copy_payload(&mut Cursor::new(&[][..]), &mut out, 0).unwrap();
        assert_eq!(copied, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn copy_stops_at_declared_length() {
        let data = vec![3u8; 600];
        let mut out = vec![];
        copy_payload(&mut Cursor::new(&data), &mut out, 100).unwrap();
        assert_eq!(out.len(), 512);
        assert!(out[100..].iter().all(|b| *b == 0));
    }

    #[test]
    fn copy_of_shrunk_source_fails() {
        let data = vec![3u8; 10];
        let mut out = vec![];
        match copy_payload(&mut Cursor::new(&data), &mut out, 20) {
            Err(CopyError::Read(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn short_write_is_an_error() {
        let mut buf = [0u8; 100];
        let mut out = Cursor::new(&mut buf[..]);
        assert!(write_footer(&mut out).is_err());
    }

    #[test]
    fn remove_footer_saturates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.tar");
        std::fs::write(&path, vec![0u8; 100]).unwrap();

        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        assert_eq!(remove_footer(&file).unwrap(), 0);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
    }

    #[test]
    fn remove_footer_cuts_two_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("full.tar");
        std::fs::write(&path, vec![1u8; 2048]).unwrap();

        let file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
        assert_eq!(remove_footer(&file).unwrap(), 1024);
        assert_eq!(std::fs::read(&path).unwrap(), vec![1u8; 1024]);
    }
}
