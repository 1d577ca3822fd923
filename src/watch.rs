//! Hot reload for dry runs.
//! Watches every non-ignored directory of a template and reruns a callback
//! each time something inside changes.

use crate::error::{Error, Result};
use crate::ignore::{collect_directory_paths, IgnoreSet};
use log::{debug, error, info};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::time::Duration;

/// Blocks watching `ignore.base()` and calls `on_change` after every
/// relevant change. Errors from `on_change` are logged and watching goes on.
///
/// # Errors
/// * `Error::WatchError` if the watcher fails
pub fn watch_directory<F>(ignore: &IgnoreSet, mut on_change: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    loop {
        wait_for_change(ignore, None)?;
        info!("Change detected in '{}', filling again", ignore.base().display());
        if let Err(e) = on_change() {
            error!("{e}");
        }
    }
}

/// Registers a fresh watcher and waits for one relevant change.
///
/// Returns `false` if `timeout` elapsed first. The watcher is dropped
/// before returning so that new directories are picked up next time.
pub fn wait_for_change(ignore: &IgnoreSet, timeout: Option<Duration>) -> Result<bool> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = RecommendedWatcher::new(tx, notify::Config::default())?;
    for directory in collect_directory_paths(ignore)? {
        debug!("Watching '{}'", directory.display());
        watcher.watch(&directory, RecursiveMode::NonRecursive)?;
    }

    loop {
        let received = match timeout {
            Some(timeout) => match rx.recv_timeout(timeout) {
                Ok(event) => event,
                Err(RecvTimeoutError::Timeout) => return Ok(false),
                Err(RecvTimeoutError::Disconnected) => return Ok(false),
            },
            None => match rx.recv() {
                Ok(event) => event,
                Err(_) => return Ok(false),
            },
        };
        let event = received.map_err(Error::WatchError)?;
        if is_relevant(&event, ignore) {
            debug!("Relevant change: {:?}", event.paths);
            return Ok(true);
        }
    }
}

/// Editor backup files (`name~`) and ignored paths do not count.
pub fn is_relevant(event: &Event, ignore: &IgnoreSet) -> bool {
    if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)) {
        return false;
    }
    event.paths.iter().any(|path| {
        !path.to_string_lossy().ends_with('~') && !ignore.is_ignored(path)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind};
    use std::path::PathBuf;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_is_relevant() {
        let ignore = IgnoreSet::new("/tpl", &["out"]).unwrap();
        assert!(is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/tpl/a.txt"), &ignore));
        assert!(is_relevant(&event(EventKind::Create(CreateKind::File), "/tpl/b.txt"), &ignore));
        assert!(!is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/tpl/a.txt~"), &ignore));
        assert!(!is_relevant(&event(EventKind::Modify(ModifyKind::Any), "/tpl/out/a.txt"), &ignore));
        assert!(!is_relevant(&event(EventKind::Access(AccessKind::Any), "/tpl/a.txt"), &ignore));
    }

    #[test]
    fn test_wait_for_change_times_out() {
        let dir = tempfile::TempDir::new().unwrap();
        let ignore = IgnoreSet::new(dir.path(), &[] as &[&str]).unwrap();
        assert!(!wait_for_change(&ignore, Some(Duration::from_millis(50))).unwrap());
    }
}
