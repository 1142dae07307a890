//! One run of the diff-accounting pipeline.
//!
//! config → aggregate → evaluate. Configuration is read on every run so
//! edits to `.diffnanny.toml` take effect on the next trigger.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nanny_core::{ConfigOverrides, DiffReport, NannyConfig, NannyError};
use nanny_difflens::aggregate::aggregate;
use nanny_difflens::filter::ExcludeSet;
use nanny_difflens::source::DiffSource;

/// Everything needed to compute a [`DiffReport`] for one directory.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use nanny_difflens::source::GitCli;
/// use nanny_watch::Pipeline;
///
/// # async fn run() -> nanny_core::Result<()> {
/// let pipeline = Pipeline::new(".", Arc::new(GitCli::new(Duration::from_secs(10))));
/// let report = pipeline.run().await?;
/// println!("{}", report.totals);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Pipeline {
    root: PathBuf,
    config_path: Option<PathBuf>,
    overrides: ConfigOverrides,
    source: Arc<dyn DiffSource>,
}

impl Pipeline {
    pub fn new(root: impl Into<PathBuf>, source: Arc<dyn DiffSource>) -> Self {
        Self {
            root: root.into(),
            config_path: None,
            overrides: ConfigOverrides::default(),
            source,
        }
    }

    /// Read configuration from `path` instead of `<root>/.diffnanny.toml`.
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    /// Command-line values layered over the file on every run.
    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// The directory whose changes are counted.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The configuration file this pipeline reads, whether or not it exists.
    pub fn watched_config_path(&self) -> PathBuf {
        self.config_path
            .clone()
            .unwrap_or_else(|| NannyConfig::default_path(&self.root))
    }

    /// Load the file configuration with overrides applied.
    ///
    /// # Errors
    ///
    /// Propagates [`NannyConfig::load`] errors.
    pub fn load_config(&self) -> Result<NannyConfig, NannyError> {
        let config = NannyConfig::load(&self.root, self.config_path.as_deref())?;
        Ok(self.overrides.apply(config))
    }

    /// Run once, failing only if the configuration cannot be loaded.
    ///
    /// # Errors
    ///
    /// Configuration errors. Git failures yield zero totals instead.
    pub async fn run(&self) -> Result<DiffReport, NannyError> {
        let config = self.load_config()?;
        let excludes = ExcludeSet::new(&config.excludes)?;
        Ok(self.evaluate(&config, &excludes).await)
    }

    /// Run once, falling back to default settings on a bad configuration.
    pub async fn run_lenient(&self) -> DiffReport {
        let config = match self.load_config() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "could not load configuration, using defaults");
                self.overrides.apply(NannyConfig::default())
            }
        };
        self.run_with(&config).await
    }

    /// Run once with an already resolved configuration.
    pub async fn run_with(&self, config: &NannyConfig) -> DiffReport {
        let excludes = ExcludeSet::lenient(&config.excludes);
        self.evaluate(config, &excludes).await
    }

    async fn evaluate(&self, config: &NannyConfig, excludes: &ExcludeSet) -> DiffReport {
        let base = config.base();
        let tally = aggregate(self.source.as_ref(), &self.root, excludes, base).await;

        let mut report = DiffReport::new(tally.totals, &config.limits());
        report.files_counted = tally.files_counted;
        report.files_excluded = tally.files_excluded;
        report.base = base.map(str::to_string);

        tracing::info!(
            inserted = report.totals.inserted,
            deleted = report.totals.deleted,
            warning = report.is_warning(),
            "diff updated"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nanny_core::DiffTotals;
    use std::sync::Mutex;

    struct FixedSource {
        output: &'static str,
        bases: Mutex<Vec<Option<String>>>,
    }

    impl FixedSource {
        fn new(output: &'static str) -> Arc<Self> {
            Arc::new(Self {
                output,
                bases: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl DiffSource for FixedSource {
        async fn numstat(&self, _workdir: &Path, base: Option<&str>) -> Result<String, NannyError> {
            self.bases.lock().unwrap().push(base.map(str::to_string));
            Ok(self.output.to_string())
        }
    }

    const OUTPUT: &str = "10\t2\tfile1.ts\n0\t0\tfile2.lock\n-\t-\timg.png\n";

    #[tokio::test]
    async fn reads_config_from_root() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".diffnanny.toml"),
            "excludes = [\"*.lock\"]\nmaxDiffTotal = 5\nmaxDiffInserts = -1\nmaxDiffRemovals = -1\n",
        )
        .unwrap();

        let pipeline = Pipeline::new(dir.path(), FixedSource::new(OUTPUT));
        let report = pipeline.run().await.unwrap();
        assert_eq!(report.totals, DiffTotals::new(10, 2));
        assert!(report.status.total);
        assert!(report.is_warning());
        assert_eq!(report.files_counted, 1);
        assert_eq!(report.files_excluded, 1);
    }

    #[tokio::test]
    async fn no_config_means_no_limits() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::new(dir.path(), FixedSource::new(OUTPUT));
        let report = pipeline.run().await.unwrap();
        assert_eq!(report.totals, DiffTotals::new(10, 2));
        assert!(!report.is_warning());
        assert_eq!(report.base, None);
    }

    #[tokio::test]
    async fn config_edits_apply_on_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join(".diffnanny.toml");
        let pipeline = Pipeline::new(dir.path(), FixedSource::new(OUTPUT));

        std::fs::write(&config, "max_diff_inserts = 20\n").unwrap();
        assert!(!pipeline.run().await.unwrap().is_warning());

        std::fs::write(&config, "max_diff_inserts = 9\n").unwrap();
        assert!(pipeline.run().await.unwrap().status.inserts);
    }

    #[tokio::test]
    async fn base_branch_reaches_the_source() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".diffnanny.toml"), "baseBranch = \"main\"\n").unwrap();
        let source = FixedSource::new(OUTPUT);
        let pipeline = Pipeline::new(dir.path(), source.clone());

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.base.as_deref(), Some("main"));
        assert_eq!(*source.bases.lock().unwrap(), vec![Some("main".to_string())]);
    }

    #[tokio::test]
    async fn overrides_apply_on_top_of_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".diffnanny.toml"), "max_diff_total = 100\n").unwrap();
        let pipeline = Pipeline::new(dir.path(), FixedSource::new(OUTPUT)).overrides(
            ConfigOverrides {
                max_total: Some(11),
                excludes: vec!["file1.ts".into()],
                ..ConfigOverrides::default()
            },
        );

        let report = pipeline.run().await.unwrap();
        assert_eq!(report.totals, DiffTotals::default());
        assert_eq!(report.files_excluded, 1);
        assert!(!report.is_warning());
    }

    #[tokio::test]
    async fn strict_run_rejects_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".diffnanny.toml"), "excludes = [\"[oops\"]\n").unwrap();
        let pipeline = Pipeline::new(dir.path(), FixedSource::new(OUTPUT));
        assert!(matches!(
            pipeline.run().await,
            Err(NannyError::InvalidGlob { .. })
        ));

        std::fs::write(dir.path().join(".diffnanny.toml"), "not toml at all [").unwrap();
        assert!(matches!(pipeline.run().await, Err(NannyError::Toml(_))));
    }

    #[tokio::test]
    async fn lenient_run_survives_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".diffnanny.toml"), "not toml at all [").unwrap();
        let pipeline = Pipeline::new(dir.path(), FixedSource::new(OUTPUT));
        let report = pipeline.run_lenient().await;
        assert_eq!(report.totals, DiffTotals::new(10, 2));
    }

    #[test]
    fn explicit_config_path_is_watched() {
        let pipeline = Pipeline::new("/repo", FixedSource::new(""))
            .config_path(Some(PathBuf::from("/etc/nanny.toml")));
        assert_eq!(pipeline.watched_config_path(), PathBuf::from("/etc/nanny.toml"));

        let pipeline = Pipeline::new("/repo", FixedSource::new(""));
        assert_eq!(
            pipeline.watched_config_path(),
            PathBuf::from("/repo/.diffnanny.toml")
        );
    }
}
