use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Polls a file's modification time; reports each change once.
pub struct FileWatcher {
    path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl FileWatcher {
    pub fn new(path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&path);
        Self {
            path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "mh_watch_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn watcher_detects_newly_created_file() {
        let path = temp_file_path("create");
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload(), "missing file should not reload");

        fs::write(&path, "{}").expect("write file");
        assert!(
            watcher.should_reload(),
            "creating file should trigger reload once"
        );
        assert!(
            !watcher.should_reload(),
            "without changes, second poll should not reload"
        );

        let _ = fs::remove_file(path);
    }

    #[test]
    fn watcher_detects_newer_mtime() {
        let path = temp_file_path("touch");
        fs::write(&path, "{}").expect("write file");
        let mut watcher = FileWatcher::new(path.clone());
        assert!(!watcher.should_reload());

        let file = fs::File::options()
            .write(true)
            .open(&path)
            .expect("open file");
        let later = SystemTime::now() + Duration::from_secs(5);
        file.set_modified(later).expect("set mtime");
        drop(file);

        assert!(watcher.should_reload());
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }
}
