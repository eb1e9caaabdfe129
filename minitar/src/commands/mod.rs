use std::path::{Path, PathBuf};

use crate::error::Error;

pub mod append;
pub mod create;
pub mod extract;
pub mod list;
pub mod update;

pub use append::run as append;
pub use create::run as create;
pub use extract::run as extract;
pub use list::run as list;
pub use update::run as update;

/// Inputs shared by every command that writes entries into an archive.
pub(crate) fn check_inputs(archive: &Path, files: &[PathBuf]) -> Result<(), Error> {
    if files.is_empty() {
        return Err(Error::NoFilesSpecified);
    }

    if files.iter().any(|file| file == archive) {
        return Err(Error::ArchiveInInputs {
            path: archive.to_path_buf(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_empty_file_list() {
        assert!(matches!(
            check_inputs(Path::new("a.tar"), &[]),
            Err(Error::NoFilesSpecified)
        ));
    }

    #[test]
    fn refuses_self_archiving() {
        let files = vec![PathBuf::from("one"), PathBuf::from("a.tar")];
        assert!(matches!(
            check_inputs(Path::new("a.tar"), &files),
            Err(Error::ArchiveInInputs { .. })
        ));
    }

    #[test]
    fn accepts_duplicates() {
        let files = vec![PathBuf::from("one"), PathBuf::from("one")];
        assert!(check_inputs(Path::new("a.tar"), &files).is_ok());
    }
}
