use std::path::PathBuf;

/// Errors that can occur across diff-nanny.
///
/// Library crates use this type directly; the binary converts to
/// `miette` diagnostics at the boundary. The diff aggregator never lets
/// these escape: git failures degrade to zero totals instead.
///
/// # Examples
///
/// ```
/// use nanny_core::NannyError;
///
/// let err = NannyError::Git("not a git repository".into());
/// assert!(err.to_string().contains("not a git repository"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum NannyError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The diff command failed to run or exited unsuccessfully.
    #[error("git error: {0}")]
    Git(String),

    /// An exclusion pattern is not a valid glob.
    #[error("invalid glob pattern '{pattern}': {message}")]
    InvalidGlob { pattern: String, message: String },

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// File-system watcher failure.
    #[error("watch error: {0}")]
    Watch(String),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: NannyError = io_err.into();
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn invalid_glob_names_pattern() {
        let err = NannyError::InvalidGlob {
            pattern: "[oops".into(),
            message: "unclosed bracket".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid glob pattern '[oops': unclosed bracket"
        );
    }

    #[test]
    fn file_not_found_shows_path() {
        let err = NannyError::FileNotFound(PathBuf::from("/tmp/.diffnanny.toml"));
        assert!(err.to_string().contains("/tmp/.diffnanny.toml"));
    }
}
