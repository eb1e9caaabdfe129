use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cowardly refusing to add archive `{}` to itself", .path.display())]
    ArchiveInInputs { path: PathBuf },

    #[error("No files specified to add to archive")]
    NoFilesSpecified,
}
