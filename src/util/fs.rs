use crate::constants;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Create `path` with `mode` unless it is already a directory. Returns whether it was created.
pub fn ensure_dir(path: &Path, mode: u32) -> Result<bool> {
    if path.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))?;
    set_permissions(path, mode)?;
    Ok(true)
}

pub fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    {
        let perm = fs::Permissions::from_mode(mode);
        fs::set_permissions(path, perm)
            .with_context(|| format!("set permissions {:o} on {}", mode, path.display()))?;
    }
    Ok(())
}

pub fn mode_of(path: &Path) -> Option<u32> {
    #[cfg(unix)]
    {
        fs::metadata(path).ok().map(|m| m.permissions().mode() & 0o777)
    }
    #[cfg(not(unix))]
    {
        let _ = path;
        None
    }
}

/// Create a temp file next to `target`, so the final rename stays on one filesystem.
pub fn temp_beside(target: &Path) -> Result<NamedTempFile> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let name = target
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("artifact");
    tempfile::Builder::new()
        .prefix(&format!("{}{}.", constants::TEMP_PREFIX, name))
        .tempfile_in(dir)
        .with_context(|| format!("create temp file in {}", dir.display()))
}

/// Move a finished temp file into place.
///
/// With `overwrite == false` the rename refuses to replace an existing file.
pub fn persist(tmp: NamedTempFile, target: &Path, mode: u32, overwrite: bool) -> Result<()> {
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("sync temp file for {}", target.display()))?;
    set_permissions(tmp.path(), mode)?;
    if overwrite {
        tmp.persist(target)
            .map_err(|err| anyhow::anyhow!("persist {}: {}", target.display(), err))?;
    } else {
        tmp.persist_noclobber(target)
            .map_err(|err| anyhow::anyhow!("persist {}: {}", target.display(), err))?;
    }
    Ok(())
}

/// Write `content` to `target` through a temp file and rename.
pub fn write_atomic(target: &Path, content: &[u8], mode: u32, overwrite: bool) -> Result<()> {
    let mut tmp = temp_beside(target)?;
    tmp.write_all(content)
        .with_context(|| format!("write temp file for {}", target.display()))?;
    tmp.flush()
        .with_context(|| format!("flush temp file for {}", target.display()))?;
    persist(tmp, target, mode, overwrite)
}

/// Temp files left behind by a killed run.
pub fn stale_temp_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = dir.join(format!("{}*", constants::TEMP_PREFIX));
    let pattern = pattern
        .to_str()
        .with_context(|| format!("non-UTF-8 path {}", dir.display()))?;
    let mut out = Vec::new();
    for entry in glob::glob(pattern).context("build temp file pattern")? {
        out.push(entry.context("read temp file entry")?);
    }
    out.sort();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_dir_reports_creation() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b");
        assert!(ensure_dir(&target, 0o700).unwrap());
        assert!(!ensure_dir(&target, 0o700).unwrap());
        assert!(target.is_dir());
        #[cfg(unix)]
        assert_eq!(mode_of(&target), Some(0o700));
    }

    #[test]
    fn test_write_atomic_noclobber_keeps_existing() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("salt");
        write_atomic(&target, b"first", 0o600, false).unwrap();
        assert!(write_atomic(&target, b"second", 0o600, false).is_err());
        assert_eq!(fs::read(&target).unwrap(), b"first");
        assert!(stale_temp_files(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_write_atomic_overwrite_replaces() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("cert.pem");
        write_atomic(&target, b"one", 0o644, true).unwrap();
        write_atomic(&target, b"two", 0o644, true).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"two");
    }

    #[test]
    fn test_stale_temp_files_found() {
        let dir = TempDir::new().unwrap();
        let tmp = temp_beside(&dir.path().join("privkey.pem")).unwrap();
        let (_file, kept) = tmp.keep().unwrap();
        fs::write(dir.path().join("cert.pem"), b"x").unwrap();
        assert_eq!(stale_temp_files(dir.path()).unwrap(), vec![kept]);
    }
}
