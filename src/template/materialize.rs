//! Template materialization.
//!
//! Copies a template's file tree verbatim into the target directory. No
//! substitution happens here; parameterization is the hook's job.

use crate::template::{TemplateError, TemplateFiles, TemplateHandle};
use include_dir::{Dir, DirEntry};
use std::fs;
use std::path::Path;

/// Copy the template's boilerplate into `target_dir`, creating it if needed.
///
/// Existing files with the same names are overwritten; unrelated files
/// already in the directory are left alone.
pub fn materialize(handle: &TemplateHandle, target_dir: &Path) -> Result<(), TemplateError> {
    fs::create_dir_all(target_dir).map_err(|e| io_error(target_dir, e))?;

    match &handle.files {
        // Entries of a nested embedded dir keep their full path prefix, so
        // the prefix is stripped here rather than using Dir::extract.
        TemplateFiles::Embedded(dir) => extract_embedded(dir, dir.path(), target_dir),
        TemplateFiles::OnDisk(source) => copy_tree(source, target_dir),
    }
}

fn extract_embedded(dir: &Dir<'_>, root: &Path, target: &Path) -> Result<(), TemplateError> {
    for entry in dir.entries() {
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let dest = target.join(rel);
        match entry {
            DirEntry::Dir(subdir) => {
                fs::create_dir_all(&dest).map_err(|e| io_error(&dest, e))?;
                extract_embedded(subdir, root, target)?;
            }
            DirEntry::File(file) => {
                fs::write(&dest, file.contents()).map_err(|e| io_error(&dest, e))?;
            }
        }
    }
    Ok(())
}

fn copy_tree(source: &Path, target: &Path) -> Result<(), TemplateError> {
    for entry in fs::read_dir(source).map_err(|e| io_error(source, e))? {
        let entry = entry.map_err(|e| io_error(source, e))?;
        let dest = target.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| io_error(&entry.path(), e))?;

        if file_type.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| io_error(&dest, e))?;
            copy_tree(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest).map_err(|e| io_error(&dest, e))?;
        }
    }
    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> TemplateError {
    TemplateError::Io {
        message: format!("{}: {}", path.display(), e),
    }
}
