use std::path::PathBuf;

use anyhow::{Context, Result};

pub fn run(archive: PathBuf, files: Vec<PathBuf>) -> Result<()> {
    super::check_inputs(&archive, &files)?;

    minitar_format::create(&archive, &files)
        .with_context(|| format!("Failed to create archive `{}`", archive.display()))
}
