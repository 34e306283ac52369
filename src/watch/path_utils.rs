// src/watch/path_utils.rs

//! Matching filesystem events against the paths a task watches.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind};

use crate::errors::{Result, RfileError};
use crate::fs::FileSystem;

/// One validated watch path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedPath {
    /// As the watch source wrote it; used in messages.
    pub display: PathBuf,
    /// Joined onto the working directory; what gets registered.
    pub absolute: PathBuf,
    /// Resolved form, when it differs from `absolute` (symlinks, `/private`
    /// on macOS, `..` segments).
    pub canonical: Option<PathBuf>,
    pub is_dir: bool,
}

impl WatchedPath {
    /// Whether `path` is this path, or sits directly inside it when it is a
    /// directory.
    pub fn matches(&self, path: &Path) -> bool {
        if self.is(path) {
            return true;
        }
        self.is_dir && path.parent().is_some_and(|parent| self.is(parent))
    }

    fn is(&self, path: &Path) -> bool {
        path == self.absolute || self.canonical.as_deref() == Some(path)
    }
}

/// Check that every path exists and resolve it against `cwd`.
///
/// Missing paths are reported together, as written.
pub fn validate_paths(
    fs: &dyn FileSystem,
    cwd: &Path,
    paths: &[PathBuf],
) -> Result<Vec<WatchedPath>> {
    let missing: Vec<String> = paths
        .iter()
        .filter(|p| !fs.exists(&cwd.join(p)))
        .map(|p| p.display().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(RfileError::user(format!(
            "Some paths to watch didn't exist: {}",
            missing.join(", ")
        )));
    }

    Ok(paths
        .iter()
        .map(|p| {
            let absolute = cwd.join(p);
            let canonical = fs.canonicalize(&absolute).ok().filter(|c| *c != absolute);
            WatchedPath {
                display: p.clone(),
                is_dir: fs.is_dir(&absolute),
                absolute,
                canonical,
            }
        })
        .collect())
}

/// The first path in `event` that concerns one of `watched`.
///
/// Access notifications (open, read, close) are skipped; a write is already
/// reported as a modification.
pub fn changed_path(watched: &[WatchedPath], event: &Event) -> Option<PathBuf> {
    if matches!(event.kind, EventKind::Access(_)) {
        return None;
    }
    event
        .paths
        .iter()
        .find(|path| watched.iter().any(|w| w.matches(path)))
        .cloned()
}

/// One line per path, blank lines skipped.
pub fn paths_from_output(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use notify::event::{AccessKind, AccessMode, CreateKind, ModifyKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    fn watched() -> Vec<WatchedPath> {
        let fs = MockFileSystem::new();
        fs.add_file("/work/src/main.rs", "");
        fs.add_file("/work/notes.txt", "");
        validate_paths(
            &fs,
            Path::new("/work"),
            &[PathBuf::from("src"), PathBuf::from("notes.txt")],
        )
        .unwrap()
    }

    #[test]
    fn missing_paths_are_listed_as_written() {
        let fs = MockFileSystem::new();
        fs.add_file("/work/a.txt", "");
        let err = validate_paths(
            &fs,
            Path::new("/work"),
            &[PathBuf::from("gone"), PathBuf::from("a.txt"), PathBuf::from("also/gone")],
        )
        .unwrap_err();
        assert!(err.is_user_error());
        assert_eq!(err.to_string(), "Some paths to watch didn't exist: gone, also/gone");
    }

    #[test]
    fn accepts_registered_files_and_direct_children_of_dirs() {
        let watched = watched();
        let modify = EventKind::Modify(ModifyKind::Any);

        assert_eq!(
            changed_path(&watched, &event(modify, "/work/notes.txt")),
            Some(PathBuf::from("/work/notes.txt"))
        );
        assert_eq!(
            changed_path(&watched, &event(EventKind::Create(CreateKind::File), "/work/src/lib.rs")),
            Some(PathBuf::from("/work/src/lib.rs"))
        );
        assert_eq!(changed_path(&watched, &event(modify, "/work/src/nested/x.rs")), None);
        assert_eq!(changed_path(&watched, &event(modify, "/work/other.txt")), None);
    }

    #[test]
    fn access_notifications_are_ignored() {
        let watched = watched();
        let close = EventKind::Access(AccessKind::Close(AccessMode::Write));
        assert_eq!(changed_path(&watched, &event(close, "/work/notes.txt")), None);
        let open = EventKind::Access(AccessKind::Open(AccessMode::Any));
        assert_eq!(changed_path(&watched, &event(open, "/work/notes.txt")), None);
    }

    #[test]
    fn output_lines_become_paths() {
        assert_eq!(
            paths_from_output("a.txt\n\n  b/c.rs  \n"),
            vec![PathBuf::from("a.txt"), PathBuf::from("b/c.rs")]
        );
    }
}
