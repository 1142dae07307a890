//! What causes a recompute.

use std::path::{Path, PathBuf};

use notify::{Event, EventKind};

/// A reason to recompute the totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// The session just started.
    Activation,
    /// A file under the watched root was created, changed, or removed.
    FileChanged(PathBuf),
    /// The configuration file changed.
    ConfigChanged,
}

/// Decides which file-system events are triggers.
///
/// Everything under the root counts, except git's own bookkeeping: inside
/// `.git/` only `index` (staging) and `HEAD` (checkout) matter.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use nanny_watch::{Trigger, TriggerFilter};
///
/// let filter = TriggerFilter::new("/repo", "/repo/.diffnanny.toml");
/// assert!(filter.classify(Path::new("/repo/src/main.rs")).is_some());
/// assert_eq!(filter.classify(Path::new("/repo/.diffnanny.toml")), Some(Trigger::ConfigChanged));
/// assert_eq!(filter.classify(Path::new("/repo/.git/objects/ab/cdef")), None);
/// ```
#[derive(Debug, Clone)]
pub struct TriggerFilter {
    root: PathBuf,
    config_path: PathBuf,
}

const GIT_DIR: &str = ".git";
const GIT_FILES_OF_INTEREST: &[&str] = &["index", "HEAD"];

impl TriggerFilter {
    pub fn new(root: impl Into<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_path: config_path.into(),
        }
    }

    /// The trigger for a change to `path`, if it is one.
    pub fn classify(&self, path: &Path) -> Option<Trigger> {
        if path == self.config_path {
            return Some(Trigger::ConfigChanged);
        }

        let relative = path.strip_prefix(&self.root).ok()?;
        let mut components = relative.components();
        let first = components.next()?;

        if first.as_os_str() == GIT_DIR {
            let rest = components.as_path();
            let interesting = GIT_FILES_OF_INTEREST
                .iter()
                .any(|name| rest == Path::new(name));
            return interesting.then(|| Trigger::FileChanged(path.to_path_buf()));
        }

        Some(Trigger::FileChanged(path.to_path_buf()))
    }

    /// The trigger for a watcher event, if any of its paths is one.
    ///
    /// Pure access events (opens, reads) never trigger.
    pub fn classify_event(&self, event: &Event) -> Option<Trigger> {
        match event.kind {
            EventKind::Access(_) => None,
            _ => event.paths.iter().find_map(|path| self.classify(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind};

    fn filter() -> TriggerFilter {
        TriggerFilter::new("/repo", "/repo/.diffnanny.toml")
    }

    #[test]
    fn source_files_trigger() {
        let trigger = filter().classify(Path::new("/repo/src/lib.rs"));
        assert_eq!(
            trigger,
            Some(Trigger::FileChanged(PathBuf::from("/repo/src/lib.rs")))
        );
    }

    #[test]
    fn git_internals_are_ignored_except_index_and_head() {
        let filter = filter();
        assert!(filter.classify(Path::new("/repo/.git/index")).is_some());
        assert!(filter.classify(Path::new("/repo/.git/HEAD")).is_some());
        assert!(filter.classify(Path::new("/repo/.git/index.lock")).is_none());
        assert!(filter.classify(Path::new("/repo/.git/refs/heads/main")).is_none());
        assert!(filter.classify(Path::new("/repo/.git")).is_none());
    }

    #[test]
    fn gitignore_and_lookalikes_still_trigger() {
        let filter = filter();
        assert!(filter.classify(Path::new("/repo/.gitignore")).is_some());
        assert!(filter.classify(Path::new("/repo/docs/.git/notes")).is_some());
    }

    #[test]
    fn paths_outside_root_are_ignored() {
        assert!(filter().classify(Path::new("/elsewhere/file.rs")).is_none());
        assert!(filter().classify(Path::new("/repo")).is_none());
    }

    #[test]
    fn config_outside_root_is_recognised() {
        let filter = TriggerFilter::new("/repo", "/home/me/nanny.toml");
        assert_eq!(
            filter.classify(Path::new("/home/me/nanny.toml")),
            Some(Trigger::ConfigChanged)
        );
    }

    #[test]
    fn access_events_do_not_trigger() {
        let event = Event::new(EventKind::Access(AccessKind::Any))
            .add_path(PathBuf::from("/repo/src/lib.rs"));
        assert_eq!(filter().classify_event(&event), None);
    }

    #[test]
    fn create_modify_remove_trigger() {
        for kind in [
            EventKind::Create(CreateKind::File),
            EventKind::Modify(ModifyKind::Any),
            EventKind::Remove(RemoveKind::File),
        ] {
            let event = Event::new(kind).add_path(PathBuf::from("/repo/a.txt"));
            assert!(filter().classify_event(&event).is_some(), "{kind:?}");
        }
    }

    #[test]
    fn event_uses_first_relevant_path() {
        let event = Event::new(EventKind::Modify(ModifyKind::Any))
            .add_path(PathBuf::from("/repo/.git/objects/x"))
            .add_path(PathBuf::from("/repo/.diffnanny.toml"));
        assert_eq!(filter().classify_event(&event), Some(Trigger::ConfigChanged));
    }
}
