use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::shared::{AmbiguityPolicy, LocatorConfig};
use crate::utils::file_utils;
use crate::utils::logger;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{dir}: {count} {kind} candidates ({names}); keep one or run with --on-ambiguous last", count = .candidates.len(), names = .candidates.join(", "))]
    Ambiguous {
        dir: PathBuf,
        kind: &'static str,
        candidates: Vec<String>,
    },
}

/// A folder holding one annotation document and one camera recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub dir: PathBuf,
    pub annotation: PathBuf,
    pub video: PathBuf,
}

#[derive(Debug, Default, Serialize)]
pub struct SessionScan {
    pub sessions: Vec<Session>,
    /// Folders holding only one of the two required files
    pub incomplete: Vec<PathBuf>,
}

/// Walk `root` (itself included) depth-first in name order, collecting session folders.
pub fn locate_sessions(root: &Path, config: &LocatorConfig) -> Result<SessionScan> {
    let mut scan = SessionScan::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let (subdirs, files) = file_utils::list_dir(&dir)?;
        // reversed so the stack pops them in name order
        pending.extend(subdirs.into_iter().rev());

        let mut annotations = Vec::new();
        let mut videos = Vec::new();
        for file in files {
            let name = file_utils::file_name(&file);
            if file_utils::matches_pattern(&name, &config.annotation_prefix, &config.annotation_extension) {
                annotations.push(file);
            } else if file_utils::matches_pattern(&name, &config.video_prefix, &config.video_extension) {
                videos.push(file);
            }
        }

        match (annotations.is_empty(), videos.is_empty()) {
            (true, true) => {}
            (false, false) => {
                let annotation = pick(&dir, "annotation", annotations, config.on_ambiguous)?;
                let video = pick(&dir, "video", videos, config.on_ambiguous)?;
                logger::debug(&format!("session found: {}", dir.display()));
                scan.sessions.push(Session { dir, annotation, video });
            }
            _ => {
                logger::debug(&format!("incomplete session folder skipped: {}", dir.display()));
                scan.incomplete.push(dir);
            }
        }
    }

    Ok(scan)
}

/// `candidates` is non-empty and sorted by name.
fn pick(
    dir: &Path,
    kind: &'static str,
    mut candidates: Vec<PathBuf>,
    policy: AmbiguityPolicy,
) -> Result<PathBuf, SessionError> {
    if candidates.len() > 1 && policy == AmbiguityPolicy::Strict {
        return Err(SessionError::Ambiguous {
            dir: dir.to_path_buf(),
            kind,
            candidates: candidates.iter().map(|p| file_utils::file_name(p)).collect(),
        });
    }
    Ok(candidates.pop().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_finds_complete_sessions_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("s2/annotations_s2.xml"));
        touch(&root.join("s2/cam1.mp4"));
        touch(&root.join("s1/annotations.xml"));
        touch(&root.join("s1/camera.mp4"));
        touch(&root.join("s1/notes.txt"));
        touch(&root.join("deep/nested/s3/annotations.xml"));
        touch(&root.join("deep/nested/s3/cam.mp4"));

        let scan = locate_sessions(root, &LocatorConfig::default()).unwrap();
        let dirs: Vec<PathBuf> = scan.sessions.iter().map(|s| s.dir.clone()).collect();
        assert_eq!(
            dirs,
            vec![root.join("deep/nested/s3"), root.join("s1"), root.join("s2")]
        );
        assert_eq!(scan.sessions[1].annotation, root.join("s1/annotations.xml"));
        assert_eq!(scan.sessions[1].video, root.join("s1/camera.mp4"));
        assert!(scan.incomplete.is_empty());
    }

    #[test]
    fn test_root_itself_can_be_a_session() {
        let tmp = tempfile::tempdir().unwrap();
        touch(&tmp.path().join("annotations.xml"));
        touch(&tmp.path().join("cam.mp4"));

        let scan = locate_sessions(tmp.path(), &LocatorConfig::default()).unwrap();
        assert_eq!(scan.sessions.len(), 1);
        assert_eq!(scan.sessions[0].dir, tmp.path());
    }

    #[test]
    fn test_incomplete_folders_are_skipped_without_error() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("only_ann/annotations.xml"));
        touch(&root.join("only_vid/cam.mp4"));
        touch(&root.join("wrong_ext/annotations.json"));
        touch(&root.join("wrong_ext/cam.avi"));

        let scan = locate_sessions(root, &LocatorConfig::default()).unwrap();
        assert!(scan.sessions.is_empty());
        assert_eq!(scan.incomplete, vec![root.join("only_ann"), root.join("only_vid")]);
    }

    #[test]
    fn test_strict_policy_rejects_ambiguous_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("s/annotations_a.xml"));
        touch(&root.join("s/cam1.mp4"));
        touch(&root.join("s/cam2.mp4"));

        let err = locate_sessions(root, &LocatorConfig::default()).unwrap_err();
        match err.downcast_ref::<SessionError>() {
            Some(SessionError::Ambiguous { kind, candidates, .. }) => {
                assert_eq!(*kind, "video");
                assert_eq!(candidates, &vec!["cam1.mp4".to_string(), "cam2.mp4".to_string()]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_last_policy_takes_lexicographic_last() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        touch(&root.join("s/annotations_b.xml"));
        touch(&root.join("s/annotations_a.xml"));
        touch(&root.join("s/cam1.mp4"));
        touch(&root.join("s/cam2.mp4"));

        let config = LocatorConfig {
            on_ambiguous: AmbiguityPolicy::Last,
            ..LocatorConfig::default()
        };
        let scan = locate_sessions(root, &config).unwrap();
        assert_eq!(scan.sessions.len(), 1);
        assert_eq!(scan.sessions[0].annotation, root.join("s/annotations_b.xml"));
        assert_eq!(scan.sessions[0].video, root.join("s/cam2.mp4"));
    }

    #[test]
    fn test_missing_root_is_error() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(locate_sessions(&tmp.path().join("nope"), &LocatorConfig::default()).is_err());
    }
}
