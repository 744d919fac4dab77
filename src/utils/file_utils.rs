use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Child entries of `dir` split into (directories, files), each sorted by name.
/// Symlinked directories are reported as files so walks never follow them.
pub fn list_dir(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>)> {
    let mut dirs = Vec::new();
    let mut files = Vec::new();

    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read directory: {:?}", dir))? {
        let entry = entry.with_context(|| format!("Failed to read entry in: {:?}", dir))?;
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat: {:?}", entry.path()))?;
        if file_type.is_dir() {
            dirs.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }

    dirs.sort();
    files.sort();
    Ok((dirs, files))
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// `name` starts with `prefix` and ends with `.extension` (case-sensitive).
pub fn matches_pattern(name: &str, prefix: &str, extension: &str) -> bool {
    name.starts_with(prefix)
        && name
            .strip_suffix(extension)
            .map_or(false, |stem| stem.ends_with('.'))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory: {:?}", dir))
}

/// Move a file, falling back to copy + delete when a rename crosses filesystems.
/// An existing `dst` is never overwritten.
pub fn move_file(src: &Path, dst: &Path) -> Result<()> {
    if dst.exists() {
        bail!("Refusing to overwrite {:?} while moving {:?}", dst, src);
    }
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    fs::copy(src, dst).with_context(|| format!("Failed to move {:?} to {:?}", src, dst))?;
    fs::remove_file(src).with_context(|| format!("Failed to remove moved file: {:?}", src))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern("annotations_seg1.xml", "annotations", "xml"));
        assert!(matches_pattern("cam1.mp4", "cam", "mp4"));
        assert!(matches_pattern("camera_front.mp4", "cam", "mp4"));
        assert!(!matches_pattern("cam1.MP4", "cam", "mp4"));
        assert!(!matches_pattern("video_cam.mp4", "cam", "mp4"));
        assert!(!matches_pattern("cammp4", "cam", "mp4"));
        assert!(!matches_pattern("annotations.xml.bak", "annotations", "xml"));
    }

    #[test]
    fn test_list_dir_sorted_and_split() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("b_dir")).unwrap();
        fs::create_dir(tmp.path().join("a_dir")).unwrap();
        fs::write(tmp.path().join("z.txt"), b"z").unwrap();
        fs::write(tmp.path().join("m.txt"), b"m").unwrap();

        let (dirs, files) = list_dir(tmp.path()).unwrap();
        let dirs: Vec<String> = dirs.iter().map(|p| file_name(p)).collect();
        let files: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(dirs, vec!["a_dir", "b_dir"]);
        assert_eq!(files, vec!["m.txt", "z.txt"]);
    }

    #[test]
    fn test_move_file() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("clip.mp4");
        let dst_dir = tmp.path().join("train").join("left");
        fs::write(&src, b"frames").unwrap();
        ensure_dir(&dst_dir).unwrap();

        let dst = dst_dir.join("1_left_1.mp4");
        move_file(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"frames");
    }

    #[test]
    fn test_move_never_overwrites() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("clip.mp4");
        let dst = tmp.path().join("taken.mp4");
        fs::write(&src, b"new").unwrap();
        fs::write(&dst, b"old").unwrap();

        assert!(move_file(&src, &dst).is_err());
        assert_eq!(fs::read(&src).unwrap(), b"new");
        assert_eq!(fs::read(&dst).unwrap(), b"old");
    }

    #[test]
    fn test_move_missing_source_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let err = move_file(&tmp.path().join("gone.mp4"), &tmp.path().join("x.mp4"));
        assert!(err.is_err());
    }
}
