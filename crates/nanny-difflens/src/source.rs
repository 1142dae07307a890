//! Where numstat text comes from.
//!
//! [`DiffSource`] is the seam between the aggregator and the outside world.
//! [`GitCli`] shells out to `git`; tests substitute an in-memory source.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use nanny_core::NannyError;
use tokio::process::Command;

/// Produces `git diff --numstat`-shaped text for a working directory.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Numstat output for `workdir`, compared against `base` when given and
    /// against the index otherwise.
    ///
    /// # Errors
    ///
    /// Any failure to produce output, typically [`NannyError::Git`].
    async fn numstat(&self, workdir: &Path, base: Option<&str>) -> Result<String, NannyError>;
}

/// Runs `git diff --numstat` as a child process.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use nanny_difflens::source::GitCli;
///
/// let git = GitCli::new(Duration::from_secs(5));
/// assert_eq!(git.args(Some("main")), ["-c", "core.quotepath=off", "diff", "--numstat", "main", "--"]);
/// ```
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    timeout: Duration,
}

impl GitCli {
    /// Use the `git` found on `PATH`.
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("git", timeout)
    }

    /// Use a specific git executable.
    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    /// Arguments passed to git for the given base reference.
    pub fn args(&self, base: Option<&str>) -> Vec<String> {
        let mut args: Vec<String> = ["-c", "core.quotepath=off", "diff", "--numstat"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        if let Some(base) = base {
            args.push(base.to_string());
        }
        args.push("--".into());
        args
    }
}

#[async_trait]
impl DiffSource for GitCli {
    async fn numstat(&self, workdir: &Path, base: Option<&str>) -> Result<String, NannyError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(base))
            .current_dir(workdir)
            .env("GIT_OPTIONAL_LOCKS", "0")
            .stdin(Stdio::null())
            .kill_on_drop(true);

        tracing::debug!(program = %self.program, workdir = %workdir.display(), ?base, "running diff");

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result
                .map_err(|e| NannyError::Git(format!("failed to run {}: {e}", self.program)))?,
            Err(_) => {
                return Err(NannyError::Git(format!(
                    "diff timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NannyError::Git(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_without_base_diff_against_index() {
        let git = GitCli::new(Duration::from_secs(1));
        assert_eq!(
            git.args(None),
            ["-c", "core.quotepath=off", "diff", "--numstat", "--"]
        );
    }

    #[test]
    fn args_with_base_name_the_revision() {
        let git = GitCli::new(Duration::from_secs(1));
        let args = git.args(Some("origin/main"));
        assert_eq!(args[4], "origin/main");
        assert_eq!(args.last().map(String::as_str), Some("--"));
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let git = GitCli::with_program("definitely-not-a-git-binary", Duration::from_secs(5));
        let dir = tempfile::tempdir().unwrap();
        let result = git.numstat(dir.path(), None).await;
        assert!(matches!(result, Err(NannyError::Git(_))));
    }

    #[tokio::test]
    async fn missing_workdir_is_an_error() {
        let git = GitCli::new(Duration::from_secs(5));
        let result = git
            .numstat(Path::new("/nonexistent/diff-nanny/workdir"), None)
            .await;
        assert!(result.is_err());
    }
}
