//! Whole-file replacement shared by the checkpoint and the mirror.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Write `contents` to `dest` via a sibling `.tmp` file and a rename, so a
/// crash mid-write leaves either the old file or the new one.
pub(crate) fn replace_file(dest: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = tmp_path(dest);
    let result = fs::write(&tmp, contents).and_then(|_| fs::rename(&tmp, dest));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn tmp_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("out"));
    name.push(".tmp");
    dest.with_file_name(name)
}
