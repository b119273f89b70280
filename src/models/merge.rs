use std::{fs, io, path::Path};

use tracing::debug;

use super::error::{IoContext, Result, ZooError};

/// Moves `source` onto `destination`, merging with whatever is already there.
///
/// A missing destination simply receives the whole source. A source file
/// replaces an existing destination file. When both are directories, nested
/// directories are merged recursively and files already present in the
/// destination win over incoming ones, which are dropped.
pub fn merge_into(source: &Path, destination: &Path) -> Result<()> {
    if !destination.exists() {
        debug!("move {} -> {}", source.display(), destination.display());
        return move_entry(source, destination);
    }

    if !source.is_dir() {
        if destination.is_dir() {
            return Err(type_mismatch(source, destination));
        }
        debug!("replace {} with {}", destination.display(), source.display());
        return move_entry(source, destination);
    }

    if !destination.is_dir() {
        return Err(type_mismatch(source, destination));
    }

    let entries = fs::read_dir(source)
        .io_context("read directory", source)?
        .collect::<io::Result<Vec<_>>>()
        .io_context("read entry in", source)?;
    for entry in entries {
        let from = entry.path();
        let to = destination.join(entry.file_name());

        if from.is_dir() {
            merge_into(&from, &to)?;
        } else if !to.exists() {
            move_entry(&from, &to)?;
        } else if to.is_dir() {
            return Err(type_mismatch(&from, &to));
        } else {
            debug!("keep existing {}", to.display());
        }
    }
    Ok(())
}

fn move_entry(from: &Path, to: &Path) -> Result<()> {
    fs::rename(from, to).io_context("move", from)
}

fn type_mismatch(from: &Path, to: &Path) -> ZooError {
    ZooError::MergeTypeMismatch {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
    }
}
