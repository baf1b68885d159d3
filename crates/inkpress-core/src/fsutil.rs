/*
 * fsutil.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Copying build artifacts into output folders.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

/// Copy a single file, preserving its permissions.
pub fn copy_file(src: &Path, dst: &Path) -> io::Result<()> {
    // fs::copy carries the permission bits along
    fs::copy(src, dst)?;
    Ok(())
}

/// Copy a directory tree into `dst`, creating it as needed.
pub fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            copy_file(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copy `src` into `dst_dir` under its base name, recursing into directories.
pub fn copy_into(src: &Path, dst_dir: &Path) -> io::Result<()> {
    let name = src.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", src.display()),
        )
    })?;
    let dst = dst_dir.join(name);
    if src.is_dir() {
        copy_tree(src, &dst)
    } else {
        copy_file(src, &dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_tree() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("site");
        fs::create_dir_all(src.join("css/vendor")).unwrap();
        fs::write(src.join("index.html"), "<html>").unwrap();
        fs::write(src.join("css/vendor/a.css"), "a{}").unwrap();

        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        copy_into(&src, &out).unwrap();

        assert_eq!(fs::read_to_string(out.join("site/index.html")).unwrap(), "<html>");
        assert_eq!(fs::read_to_string(out.join("site/css/vendor/a.css")).unwrap(), "a{}");
    }

    #[test]
    fn test_copy_into_overwrites_file() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("doc.pdf");
        fs::write(&src, "new").unwrap();
        let out = temp.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("doc.pdf"), "old and longer").unwrap();

        copy_into(&src, &out).unwrap();
        assert_eq!(fs::read_to_string(out.join("doc.pdf")).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn test_copy_file_preserves_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let src = temp.path().join("run.sh");
        fs::write(&src, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();

        let dst = temp.path().join("copy.sh");
        copy_file(&src, &dst).unwrap();
        let mode = fs::metadata(&dst).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
