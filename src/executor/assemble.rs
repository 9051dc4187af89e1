use crate::{debug, warn};

use anyhow::{bail, Context, Result};
use std::{fs, io::ErrorKind, os::unix::fs::symlink, path::Path};
use walkdir::WalkDir;

/// Top level directories that move under /usr
const MERGED_DIRS: &[&str] = &["bin", "sbin", "lib", "include"];

/// Remove every `bin` and `sbin` directory below `root`
pub fn delete_bins(root: &Path) -> Result<()> {
    if root == Path::new("/") {
        warn!("Will not remove 'bin' directories from root ('/') directory.");
        return Ok(());
    }

    let mut it = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = it.next() {
        let entry = entry?;
        let is_bin = matches!(entry.file_name().to_str(), Some("bin") | Some("sbin"));
        if entry.file_type().is_dir() && is_bin {
            debug!("Removing {}", entry.path().display());
            fs::remove_dir_all(entry.path())
                .context(format!("Failed to remove {}", entry.path().display()))?;
            it.skip_current_dir();
        }
    }

    Ok(())
}

/// Move /bin, /sbin, /lib, /include (and /lib64 if /usr/lib64 exists) into
/// /usr and leave relative symlinks behind
pub fn merge_usr(root: &Path) -> Result<()> {
    for dir in MERGED_DIRS {
        merge_directory(root, dir)?;
    }
    if root.join("usr/lib64").is_dir() {
        merge_directory(root, "lib64")?;
    }
    Ok(())
}

fn merge_directory(root: &Path, name: &str) -> Result<()> {
    let target = format!("usr/{}", name);
    let target_path = root.join(&target);
    if !target_path.is_dir() {
        return Ok(());
    }

    let original = root.join(name);
    match fs::symlink_metadata(&original) {
        // Already merged
        Ok(meta) if meta.file_type().is_symlink() => return Ok(()),
        Ok(meta) if meta.is_dir() => {
            move_directory(&original, &target_path)?;
            fs::remove_dir_all(&original)?;
        }
        Ok(_) => bail!("{} is not a directory", original.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => (),
        Err(e) => return Err(e.into()),
    }

    symlink(&target, &original).context(format!(
        "Failed to link {} to {}",
        original.display(),
        target
    ))?;
    Ok(())
}

/// Move the content of `source` into `target`, recreating symlinks
fn move_directory(source: &Path, target: &Path) -> Result<()> {
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let dest = target.join(entry.file_name());

        if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            match fs::symlink_metadata(&dest) {
                Ok(meta) if meta.is_dir() => {
                    warn!(
                        "Not replacing directory {} with a symlink",
                        dest.display()
                    );
                    continue;
                }
                Ok(_) => fs::remove_file(&dest)?,
                Err(_) => (),
            }
            symlink(&link, &dest)?;
        } else if file_type.is_dir() {
            fs::create_dir_all(&dest)?;
            move_directory(&entry.path(), &dest)?;
        } else {
            fs::rename(entry.path(), &dest)
                .context(format!("Failed to move {}", entry.path().display()))?;
        }
    }

    Ok(())
}
