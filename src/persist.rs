//! Whole-file writes: content goes to a sibling temp file and is renamed into place.

use std::path::{Path, PathBuf};

use crate::error::{CatalogError, Result};

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Replace one file
pub fn replace_file(path: &Path, contents: &[u8]) -> Result<()> {
    write_all_or_nothing(&[(path, contents)])
}

/// Replace several files; if any write fails none of the targets is touched
///
/// Temp files are renamed in the order given. A rename failure leaves the
/// earlier targets already replaced, so callers list the file consumers read
/// last.
pub fn write_all_or_nothing(files: &[(&Path, &[u8])]) -> Result<()> {
    let mut staged: Vec<(PathBuf, &Path)> = Vec::with_capacity(files.len());

    for (target, contents) in files {
        let tmp = temp_path(target);
        let written = ensure_parent(target)
            .and_then(|_| std::fs::write(&tmp, contents).map_err(|e| CatalogError::io(&tmp, e)));
        if let Err(e) = written {
            discard(&staged);
            let _ = std::fs::remove_file(&tmp);
            return Err(e);
        }
        staged.push((tmp, *target));
    }

    for (tmp, target) in &staged {
        if let Err(e) = std::fs::rename(tmp, target) {
            discard(&staged);
            return Err(CatalogError::io(*target, e));
        }
    }

    Ok(())
}

fn discard(staged: &[(PathBuf, &Path)]) {
    for (tmp, _) in staged {
        let _ = std::fs::remove_file(tmp);
    }
}
