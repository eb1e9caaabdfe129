use std::path::PathBuf;

use anyhow::{Context, Result};
use minitar_format::ExtractOptions;

pub fn run(
    archive: PathBuf,
    directory: Option<PathBuf>,
    verify: bool,
    verbose: bool,
) -> Result<()> {
    let dest = directory.unwrap_or_else(|| PathBuf::from("."));
    let options = ExtractOptions {
        verify_checksums: verify,
    };

    let written = minitar_format::extract_with_options(&archive, &dest, options)
        .with_context(|| format!("Failed to extract archive `{}`", archive.display()))?;

    if verbose {
        for path in written {
            println!("{}", path.display());
        }
    }

    Ok(())
}
