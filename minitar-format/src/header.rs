use std::borrow::Cow;
use std::fmt;
use std::ops::Range;
use std::os::unix::fs::MetadataExt;
use std::path::Path;

use crate::block::BLOCK_SIZE;
use crate::error::{Error, Result};
use crate::path::EntryName;

/// Magic tag identifying a ustar header, including its terminating nul.
pub const MAGIC: &[u8; 6] = b"ustar\0";
pub const VERSION: &[u8; 2] = b"00";

/// Type flag of a regular file, the only kind of entry this crate writes.
pub const REGULAR_TYPE: u8 = b'0';

pub const NAME_LEN: usize = 100;
pub const OWNER_NAME_LEN: usize = 32;

const NAME: Range<usize> = 0..100;
const MODE: Range<usize> = 100..108;
const UID: Range<usize> = 108..116;
const GID: Range<usize> = 116..124;
const SIZE: Range<usize> = 124..136;
const MTIME: Range<usize> = 136..148;
const CHECKSUM: Range<usize> = 148..156;
const TYPEFLAG: usize = 156;
const MAGIC_FIELD: Range<usize> = 257..263;
const VERSION_FIELD: Range<usize> = 263..265;
const UNAME: Range<usize> = 265..297;
const GNAME: Range<usize> = 297..329;
const DEVMAJOR: Range<usize> = 329..337;
const DEVMINOR: Range<usize> = 337..345;

/// A numeric header field that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedField {
    pub field: &'static str,
    pub value: String,
}

/// One 512-byte ustar header record.
///
/// The record is kept as raw bytes so that what is checksummed and written
/// is exactly what sits in memory, independent of struct layout.
#[derive(Clone, PartialEq, Eq)]
pub struct Header([u8; BLOCK_SIZE]);

impl Header {
    /// A blank regular-file header carrying the ustar magic and version.
    pub fn new() -> Header {
        let mut header = Header([0u8; BLOCK_SIZE]);
        header.0[TYPEFLAG] = REGULAR_TYPE;
        header.0[MAGIC_FIELD].copy_from_slice(MAGIC);
        header.0[VERSION_FIELD].copy_from_slice(VERSION);
        header
    }

    pub fn from_bytes(bytes: [u8; BLOCK_SIZE]) -> Header {
        Header(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; BLOCK_SIZE] {
        &self.0
    }

    /// Build the header for the regular file at `path`, stored under `name`.
    ///
    /// The owner and group ids must both resolve to names. The checksum is
    /// computed last, once every other field is in place.
    pub fn for_file(path: &Path, name: &EntryName) -> Result<Header> {
        let meta = std::fs::metadata(path).map_err(|source| Error::Stat {
            path: path.to_path_buf(),
            source,
        })?;

        if !meta.is_file() {
            return Err(Error::NotRegularFile {
                path: path.to_path_buf(),
            });
        }

        let overflow = |field: &'static str, value: u64| Error::FieldOverflow {
            path: path.to_path_buf(),
            field,
            value,
        };

        let mut header = Header::new();
        header.set_name(name);
        header.set_mode(meta.mode() & 0o7777).map_err(|v| overflow("mode", v))?;
        header.set_uid(meta.uid()).map_err(|v| overflow("uid", v))?;
        header.set_gid(meta.gid()).map_err(|v| overflow("gid", v))?;
        header.set_size(meta.len()).map_err(|v| overflow("size", v))?;
        header
            .set_mtime(meta.mtime().max(0) as u64)
            .map_err(|v| overflow("mtime", v))?;

        let username = crate::fs::user_name(meta.uid()).ok_or_else(|| Error::OwnerLookup {
            path: path.to_path_buf(),
            uid: meta.uid(),
        })?;
        header.set_username(&username);

        let groupname = crate::fs::group_name(meta.gid()).ok_or_else(|| Error::GroupLookup {
            path: path.to_path_buf(),
            gid: meta.gid(),
        })?;
        header.set_groupname(&groupname);

        let (major, minor) = crate::fs::device_numbers(meta.dev());
        header
            .set_device_major(major)
            .map_err(|v| overflow("devmajor", v))?;
        header
            .set_device_minor(minor)
            .map_err(|v| overflow("devminor", v))?;

        header.set_checksum();

        tracing::debug!(
            name = %name,
            size = meta.len(),
            mode = format_args!("{:o}", meta.mode() & 0o7777),
            "encoded header"
        );

        Ok(header)
    }

    /// An all-zero name field marks the logical end of the archive.
    pub fn is_end_marker(&self) -> bool {
        self.0[NAME.start] == 0
    }

    pub fn is_ustar(&self) -> bool {
        &self.0[MAGIC_FIELD.start..MAGIC_FIELD.start + 5] == b"ustar"
    }

    pub fn name_bytes(&self) -> &[u8] {
        truncate(&self.0[NAME])
    }

    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.name_bytes())
    }

    pub fn set_name(&mut self, name: &EntryName) {
        copy_into(&mut self.0[NAME], name.as_bytes());
    }

    pub fn mode(&self) -> std::result::Result<u32, MalformedField> {
        self.octal("mode", MODE).map(|v| v as u32)
    }

    pub fn set_mode(&mut self, mode: u32) -> std::result::Result<(), u64> {
        octal_into(&mut self.0[MODE], mode as u64)
    }

    pub fn uid(&self) -> std::result::Result<u32, MalformedField> {
        self.octal("uid", UID).map(|v| v as u32)
    }

    pub fn set_uid(&mut self, uid: u32) -> std::result::Result<(), u64> {
        octal_into(&mut self.0[UID], uid as u64)
    }

    pub fn gid(&self) -> std::result::Result<u32, MalformedField> {
        self.octal("gid", GID).map(|v| v as u32)
    }

    pub fn set_gid(&mut self, gid: u32) -> std::result::Result<(), u64> {
        octal_into(&mut self.0[GID], gid as u64)
    }

    /// Length of the payload that follows this header, excluding padding.
    pub fn size(&self) -> std::result::Result<u64, MalformedField> {
        self.octal("size", SIZE)
    }

    pub fn set_size(&mut self, size: u64) -> std::result::Result<(), u64> {
        octal_into(&mut self.0[SIZE], size)
    }

    pub fn mtime(&self) -> std::result::Result<u64, MalformedField> {
        self.octal("mtime", MTIME)
    }

    pub fn set_mtime(&mut self, mtime: u64) -> std::result::Result<(), u64> {
        octal_into(&mut self.0[MTIME], mtime)
    }

    pub fn entry_type(&self) -> u8 {
        self.0[TYPEFLAG]
    }

    pub fn username(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(truncate(&self.0[UNAME]))
    }

    /// Owner names longer than the field are cut to fit.
    pub fn set_username(&mut self, name: &[u8]) {
        copy_into(&mut self.0[UNAME], name);
    }

    pub fn groupname(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(truncate(&self.0[GNAME]))
    }

    pub fn set_groupname(&mut self, name: &[u8]) {
        copy_into(&mut self.0[GNAME], name);
    }

    pub fn device_major(&self) -> std::result::Result<u64, MalformedField> {
        self.octal("devmajor", DEVMAJOR)
    }

    pub fn set_device_major(&mut self, major: u64) -> std::result::Result<(), u64> {
        octal_into(&mut self.0[DEVMAJOR], major)
    }

    pub fn device_minor(&self) -> std::result::Result<u64, MalformedField> {
        self.octal("devminor", DEVMINOR)
    }

    pub fn set_device_minor(&mut self, minor: u64) -> std::result::Result<(), u64> {
        octal_into(&mut self.0[DEVMINOR], minor)
    }

    /// The checksum stored in the header.
    pub fn checksum(&self) -> std::result::Result<u32, MalformedField> {
        self.octal("checksum", CHECKSUM).map(|v| v as u32)
    }

    /// Unsigned sum of every byte in the record, counting the checksum field as spaces.
    pub fn compute_checksum(&self) -> u32 {
        self.0
            .iter()
            .enumerate()
            .map(|(i, b)| {
                if CHECKSUM.contains(&i) {
                    b' ' as u32
                } else {
                    *b as u32
                }
            })
            .sum()
    }

    /// Store the checksum as six octal digits, a nul and a space.
    pub fn set_checksum(&mut self) {
        let sum = self.compute_checksum();
        let digits = format!("{:06o}", sum);
        self.0[CHECKSUM.start..CHECKSUM.start + 6].copy_from_slice(digits.as_bytes());
        self.0[CHECKSUM.start + 6] = 0;
        self.0[CHECKSUM.start + 7] = b' ';
    }

    /// Compare the stored checksum against the record, returning `(stored, computed)` when they differ.
    pub fn checksum_mismatch(&self) -> std::result::Result<Option<(u32, u32)>, MalformedField> {
        let stored = self.checksum()?;
        let computed = self.compute_checksum();
        Ok(if stored == computed {
            None
        } else {
            Some((stored, computed))
        })
    }

    fn octal(
        &self,
        field: &'static str,
        range: Range<usize>,
    ) -> std::result::Result<u64, MalformedField> {
        octal_from(&self.0[range.clone()]).ok_or_else(|| MalformedField {
            field,
            value: String::from_utf8_lossy(truncate(&self.0[range])).into_owned(),
        })
    }
}

impl Default for Header {
    fn default() -> Self {
        Header::new()
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Header")
            .field("name", &self.name())
            .field("mode", &self.mode().ok())
            .field("size", &self.size().ok())
            .field("mtime", &self.mtime().ok())
            .field("username", &self.username())
            .field("groupname", &self.groupname())
            .field("checksum", &self.checksum().ok())
            .finish()
    }
}

fn truncate(slice: &[u8]) -> &[u8] {
    match slice.iter().position(|i| *i == 0) {
        Some(i) => &slice[..i],
        None => slice,
    }
}

/// Parse an octal field, tolerating surrounding spaces and a nul terminator.
fn octal_from(slice: &[u8]) -> Option<u64> {
    let digits = std::str::from_utf8(truncate(slice)).ok()?.trim_matches(' ');
    if digits.is_empty() || !digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
        return None;
    }
    u64::from_str_radix(digits, 8).ok()
}

/// Write `value` as zero-padded octal filling all but the last byte of `dst`,
/// which becomes the nul terminator. Returns the value back if it does not fit.
fn octal_into(dst: &mut [u8], value: u64) -> std::result::Result<(), u64> {
    let width = dst.len() - 1;
    let digits = format!("{:0width$o}", value, width = width);
    if digits.len() > width {
        return Err(value);
    }
    dst[..width].copy_from_slice(digits.as_bytes());
    dst[width] = 0;
    Ok(())
}

/// Copy as much of `bytes` as fits, nul-padding the rest of the slot.
fn copy_into(slot: &mut [u8], bytes: &[u8]) {
    let len = bytes.len().min(slot.len());
    slot[..len].copy_from_slice(&bytes[..len]);
    for b in slot[len..].iter_mut() {
        *b = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Header {
        let mut header = Header::new();
        header.set_name(&EntryName::new("dir/hello.txt").unwrap());
        header.set_mode(0o644).unwrap();
        header.set_uid(1000).unwrap();
        header.set_gid(100).unwrap();
        header.set_size(5).unwrap();
        header.set_mtime(1_600_000_000).unwrap();
        header.set_username(b"alice");
        header.set_groupname(b"users");
        header.set_device_major(8).unwrap();
        header.set_device_minor(1).unwrap();
        header.set_checksum();
        header
    }

    #[test]
    fn fields_land_at_ustar_offsets() {
        let header = sample();
        let bytes = header.as_bytes();

        assert_eq!(&bytes[0..13], b"dir/hello.txt");
        assert!(bytes[13..100].iter().all(|b| *b == 0));
        assert_eq!(&bytes[100..108], b"0000644\0");
        assert_eq!(&bytes[108..116], b"0001750\0");
        assert_eq!(&bytes[116..124], b"0000144\0");
        assert_eq!(&bytes[124..136], b"00000000005\0");
        assert_eq!(&bytes[136..148], b"13727410000\0");
        assert_eq!(bytes[156], b'0');
        assert_eq!(&bytes[257..263], b"ustar\0");
        assert_eq!(&bytes[263..265], b"00");
        assert_eq!(&bytes[265..270], b"alice");
        assert_eq!(&bytes[297..302], b"users");
        assert_eq!(&bytes[329..337], b"0000010\0");
        assert_eq!(&bytes[337..345], b"0000001\0");
    }

    #[test]
    fn checksum_layout_and_value() {
        let header = sample();
        let bytes = header.as_bytes();

        assert_eq!(bytes[154], 0);
        assert_eq!(bytes[155], b' ');

        let mut blanked = *bytes;
        for b in blanked[148..156].iter_mut() {
            *b = b' ';
        }
        let expected: u32 = blanked.iter().map(|b| *b as u32).sum();

        let stored = std::str::from_utf8(&bytes[148..154]).unwrap();
        assert_eq!(u32::from_str_radix(stored, 8).unwrap(), expected);
        assert_eq!(header.checksum().unwrap(), expected);
        assert_eq!(header.checksum_mismatch().unwrap(), None);
    }

    #[test]
    fn checksum_counts_high_bytes_unsigned() {
        let mut header = Header::new();
        header.set_name(&EntryName::from_bytes(&[0xff, 0xfe]).unwrap());
        header.set_size(0).unwrap();
        header.set_checksum();

        let plain: u32 = Header::new().compute_checksum();
        assert_eq!(header.checksum().unwrap(), plain + 0xff + 0xfe + 11 * b'0' as u32);
    }

    #[test]
    fn corrupted_header_fails_verification() {
        let mut bytes = *sample().as_bytes();
        bytes[0] = b'X';
        let sum = sample().compute_checksum();
        assert_eq!(
            Header::from_bytes(bytes).checksum_mismatch().unwrap(),
            Some((sum, sum - u32::from(sample().as_bytes()[0]) + u32::from(b'X')))
        );
    }

    #[test]
    fn decode_round_trips_fields() {
        let header = Header::from_bytes(*sample().as_bytes());
        assert_eq!(header.name(), "dir/hello.txt");
        assert_eq!(header.mode().unwrap(), 0o644);
        assert_eq!(header.uid().unwrap(), 1000);
        assert_eq!(header.gid().unwrap(), 100);
        assert_eq!(header.size().unwrap(), 5);
        assert_eq!(header.mtime().unwrap(), 1_600_000_000);
        assert_eq!(header.username(), "alice");
        assert_eq!(header.groupname(), "users");
        assert_eq!(header.entry_type(), REGULAR_TYPE);
        assert_eq!(header.device_major().unwrap(), 8);
        assert_eq!(header.device_minor().unwrap(), 1);
        assert!(header.is_ustar());
        assert!(!header.is_end_marker());
    }

    #[test]
    fn size_field_tolerates_spaces() {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[0] = b'a';
        bytes[124..136].copy_from_slice(b" 1750      \0");
        assert_eq!(Header::from_bytes(bytes).size().unwrap(), 0o1750);
    }

    #[test]
    fn malformed_size_field() {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[0] = b'a';
        bytes[124..136].copy_from_slice(b"0000000009x\0");
        let err = Header::from_bytes(bytes).size().unwrap_err();
        assert_eq!(err.field, "size");
        assert_eq!(err.value, "0000000009x");
    }

    #[test]
    fn empty_size_field_is_malformed() {
        let mut bytes = [0u8; BLOCK_SIZE];
        bytes[0] = b'a';
        assert!(Header::from_bytes(bytes).size().is_err());
    }

    #[test]
    fn overflowing_values_are_rejected() {
        let mut header = Header::new();
        assert_eq!(header.set_size(0o77777777777), Ok(()));
        assert_eq!(header.set_size(0o100000000000), Err(0o100000000000));
        assert_eq!(header.set_uid(0o10000000), Err(0o10000000));
    }

    #[test]
    fn long_owner_names_are_cut() {
        let mut header = Header::new();
        header.set_username(&[b'u'; 40]);
        assert_eq!(header.username().len(), OWNER_NAME_LEN);
    }

    #[test]
    fn zero_name_is_end_marker() {
        assert!(Header::from_bytes([0u8; BLOCK_SIZE]).is_end_marker());
    }
}
