use std::ffi::OsStr;
use std::fmt;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

mod error;

pub use self::error::IntoEntryNameError;

/// The name of an entry exactly as it is stored in a header's `name` field.
///
/// Names are raw bytes: whatever path the caller supplied when the entry was
/// written, at most [`NAME_LEN`](crate::header::NAME_LEN) bytes and free of
/// nul bytes.
#[derive(Debug, Clone, PartialOrd, Ord, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EntryName(pub(crate) Vec<u8>);

/// Resolve `path` into components that stay below the directory it is joined to.
///
/// Root and `.` components are dropped and `..` discards the previous component.
pub fn sanitize(path: &Path) -> Vec<&OsStr> {
    let mut out = vec![];

    for component in path.components() {
        match component {
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(os_str) => out.push(os_str),
        }
    }

    out
}

impl EntryName {
    pub fn new<P: AsRef<Path>>(path: P) -> std::result::Result<EntryName, IntoEntryNameError> {
        Self::from_bytes(path.as_ref().as_os_str().as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> std::result::Result<EntryName, IntoEntryNameError> {
        if bytes.is_empty() {
            return Err(IntoEntryNameError::EmptyPath);
        }
        if bytes.len() > crate::header::NAME_LEN {
            return Err(IntoEntryNameError::TooLong(bytes.len()));
        }
        if bytes.contains(&0) {
            return Err(IntoEntryNameError::ContainsNul);
        }

        Ok(EntryName(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(OsStr::from_bytes(&self.0))
    }

    /// The location this entry extracts to, relative to the destination directory.
    pub fn to_relative_path(&self) -> std::result::Result<PathBuf, IntoEntryNameError> {
        let parts = sanitize(self.as_path());
        if parts.is_empty() {
            return Err(IntoEntryNameError::EmptyPath);
        }
        Ok(parts.into_iter().collect())
    }
}

impl fmt::Display for EntryName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_kept_verbatim() {
        let name = EntryName::new("./some/../dir/file.txt").unwrap();
        assert_eq!(name.as_bytes(), b"./some/../dir/file.txt");
        assert_eq!(name.to_string(), "./some/../dir/file.txt");
    }

    #[test]
    fn empty_name() {
        assert_eq!(EntryName::new(""), Err(IntoEntryNameError::EmptyPath));
    }

    #[test]
    fn name_length_limit() {
        let exact = "a".repeat(100);
        assert!(EntryName::new(&exact).is_ok());

        let long = "a".repeat(101);
        assert_eq!(EntryName::new(&long), Err(IntoEntryNameError::TooLong(101)));
    }

    #[test]
    fn nul_byte() {
        assert_eq!(
            EntryName::from_bytes(b"bad\0name"),
            Err(IntoEntryNameError::ContainsNul)
        );
    }

    #[test]
    fn relative_path_stays_inside() {
        let name = EntryName::new("/something/../somethingelse/./foo.txt").unwrap();
        assert_eq!(
            name.to_relative_path().unwrap(),
            PathBuf::from("somethingelse/foo.txt")
        );

        let name = EntryName::new("../../etc/passwd").unwrap();
        assert_eq!(
            name.to_relative_path().unwrap(),
            PathBuf::from("etc/passwd")
        );
    }

    #[test]
    fn sanitize_borrows_components() {
        let path = PathBuf::from("./a/../b/c");
        let parts = sanitize(&path);
        assert_eq!(parts, vec![OsStr::new("b"), OsStr::new("c")]);
        assert!(sanitize(Path::new("/..")).is_empty());
    }

    #[test]
    fn relative_path_of_root_only() {
        let name = EntryName::new("/").unwrap();
        assert_eq!(
            name.to_relative_path(),
            Err(IntoEntryNameError::EmptyPath)
        );

        let name = EntryName::new("a/..").unwrap();
        assert!(name.to_relative_path().is_err());
    }
}
