use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{Context, IntoDiagnostic, Result};

use nanny_core::{ConfigOverrides, DiffReport, LimitStatus, NannyConfig, OutputFormat, CONFIG_FILE_NAME};
use nanny_difflens::source::GitCli;
use nanny_watch::{Pipeline, StatusIndicator, WatchOptions};

mod logging;

#[derive(Parser)]
#[command(
    name = "diff-nanny",
    version,
    about = "Keep an eye on how much you have changed since the last commit",
    long_about = "diff-nanny counts the lines inserted and deleted in your working tree\n\
                   and warns when the total goes over the limits you set.\n\n\
                   Examples:\n  \
                     diff-nanny status                    Print +inserted | -deleted once\n  \
                     diff-nanny status --max-total 400    Warn above 400 changed lines\n  \
                     diff-nanny watch --exclude '*.lock'  Keep a live count, ignoring lock files\n  \
                     diff-nanny init                      Create a .diffnanny.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: <path>/.diffnanny.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for reports.\n\n\
                       Formats:\n  \
                         text  The +inserted | -deleted label (default)\n  \
                         json  One JSON object per report with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable verbose logging (same as DIFF_NANNY_LOG=debug)
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Count uncommitted changes once
    #[command(long_about = "Count uncommitted changes once.\n\n\
        Runs `git diff --numstat` in the directory, drops excluded paths and\n\
        binary files, and prints the totals. Outside a repository, or when git\n\
        fails, the totals are zero.\n\n\
        Examples:\n  diff-nanny status\n  diff-nanny status --base main --format json\n  diff-nanny status --max-total 500 --fail-on-limit")]
    Status {
        #[command(flatten)]
        diff: DiffArgs,

        /// Exit with code 1 when any limit is exceeded
        #[arg(long)]
        fail_on_limit: bool,
    },
    /// Keep a live count that updates as files change
    #[command(long_about = "Keep a live count that updates as files change.\n\n\
        Recounts on start, whenever a file under the directory changes, when\n\
        you stage or check out, and when the configuration file is edited.\n\
        Press Ctrl-C to stop.\n\n\
        Examples:\n  diff-nanny watch\n  diff-nanny watch --path ../service --debounce-ms 500")]
    Watch {
        #[command(flatten)]
        diff: DiffArgs,

        /// Milliseconds to gather changes before recounting (default: 200)
        #[arg(long, default_value = "200")]
        debounce_ms: u64,
    },
    /// Create a default .diffnanny.toml configuration file
    #[command(long_about = "Create a default .diffnanny.toml configuration file.\n\n\
        Writes a template with every option and its default.\n\
        Fails if .diffnanny.toml already exists.")]
    Init {
        /// Directory to create the file in (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct DiffArgs {
    /// Directory to count changes in (default: current directory)
    #[arg(long, default_value = ".")]
    path: PathBuf,

    /// Also exclude paths matching this glob (repeatable)
    #[arg(long = "exclude", value_name = "GLOB")]
    excludes: Vec<String>,

    /// Limit on inserted + deleted lines (-1 for unlimited)
    #[arg(long, allow_negative_numbers = true)]
    max_total: Option<i64>,

    /// Limit on inserted lines (-1 for unlimited)
    #[arg(long, allow_negative_numbers = true)]
    max_inserts: Option<i64>,

    /// Limit on deleted lines (-1 for unlimited)
    #[arg(long, allow_negative_numbers = true)]
    max_removals: Option<i64>,

    /// Compare against this reference (e.g. main, HEAD) instead of the index
    #[arg(long)]
    base: Option<String>,
}

impl DiffArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            excludes: self.excludes.clone(),
            max_total: self.max_total,
            max_inserts: self.max_inserts,
            max_removals: self.max_removals,
            base: self.base.clone(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mdiff-nanny\x1b[0m v{version}\n");
        println!("  \x1b[36mdiff-nanny status\x1b[0m   Count uncommitted changes once");
        println!("  \x1b[36mdiff-nanny watch\x1b[0m    Keep a live count");
        println!("  \x1b[36mdiff-nanny init\x1b[0m     Create a .diffnanny.toml\n");
    } else {
        println!("diff-nanny v{version}\n");
        println!("  diff-nanny status   Count uncommitted changes once");
        println!("  diff-nanny watch    Keep a live count");
        println!("  diff-nanny init     Create a .diffnanny.toml\n");
    }

    println!("Run 'diff-nanny <command> --help' for details.");
}

const DEFAULT_CONFIG: &str = r#"# diff-nanny configuration

# Paths left out of the totals. Globs are matched against the path git
# reports, relative to the repository root. `*` does not cross `/`.
excludes = []
# excludes = ["*.lock", "**/*.snap", "dist/**"]

# Limits on uncommitted changes. -1 means unlimited.
max_diff_total = -1
max_diff_inserts = -1
max_diff_removals = -1

# Compare against this reference instead of the index, e.g. "main" or "HEAD".
# base_branch = "main"

# Seconds to wait for git before reporting zero changes.
# git_timeout_secs = 10
"#;

/// Names of the limits `status` exceeds.
fn exceeded(status: &LimitStatus) -> Vec<&'static str> {
    [
        (status.total, "total"),
        (status.inserts, "inserts"),
        (status.removals, "removals"),
    ]
    .into_iter()
    .filter_map(|(hit, name)| hit.then_some(name))
    .collect()
}

fn render_text(report: &DiffReport, use_color: bool) -> String {
    let label = report.totals.to_string();
    if !report.is_warning() {
        return label;
    }
    let detail = format!("over limit: {}", exceeded(&report.status).join(", "));
    if use_color {
        format!("\x1b[1;33m{label}\x1b[0m  \x1b[33m{detail}\x1b[0m")
    } else {
        format!("{label}  ({detail})")
    }
}

fn render(report: &DiffReport, format: OutputFormat, use_color: bool) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(report, use_color)),
        OutputFormat::Json => serde_json::to_string(report).into_diagnostic(),
    }
}

/// Build the pipeline for `diff`, reading the git timeout from the config
/// that is in place at startup.
fn build_pipeline(diff: &DiffArgs, config_path: Option<&Path>, config: &NannyConfig) -> Pipeline {
    let source = Arc::new(GitCli::new(config.git_timeout()));
    Pipeline::new(&diff.path, source)
        .config_path(config_path.map(Path::to_path_buf))
        .overrides(diff.overrides())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    logging::setup_logger(cli.verbose);

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    match cli.command {
        None => {
            print_welcome(use_color);
        }
        Some(Command::Status {
            ref diff,
            fail_on_limit,
        }) => {
            if !diff.path.is_dir() {
                miette::bail!("{} is not a directory", diff.path.display());
            }
            let config = NannyConfig::load(&diff.path, cli.config.as_deref())
                .into_diagnostic()
                .wrap_err("loading configuration")?;
            let pipeline = build_pipeline(diff, cli.config.as_deref(), &config);

            let report = pipeline
                .run()
                .await
                .into_diagnostic()
                .wrap_err("counting changes")?;
            println!("{}", render(&report, cli.format, use_color)?);

            if fail_on_limit && report.is_warning() {
                std::process::exit(1);
            }
        }
        Some(Command::Watch {
            ref diff,
            debounce_ms,
        }) => {
            if !diff.path.is_dir() {
                miette::bail!("{} is not a directory", diff.path.display());
            }
            let config = NannyConfig::load(&diff.path, cli.config.as_deref()).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "could not load configuration, using defaults");
                NannyConfig::default()
            });
            let pipeline = build_pipeline(diff, cli.config.as_deref(), &config);
            let options = WatchOptions {
                debounce: Duration::from_millis(debounce_ms),
            };

            let live = cli.format == OutputFormat::Text && std::io::stdout().is_terminal();
            let format = cli.format;
            let render_report = move |report: &DiffReport| {
                let line = match render(report, format, use_color) {
                    Ok(line) => line,
                    Err(e) => {
                        tracing::error!(error = %e, "cannot render report");
                        return;
                    }
                };
                let mut stdout = std::io::stdout().lock();
                let written = if live {
                    write!(stdout, "\r\x1b[2K{line}").and_then(|()| stdout.flush())
                } else {
                    writeln!(stdout, "{line}")
                };
                if let Err(e) = written {
                    tracing::debug!(error = %e, "stdout closed");
                }
            };

            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %e, "cannot listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            };

            nanny_watch::watch(
                pipeline,
                Arc::new(StatusIndicator::new()),
                options,
                render_report,
                shutdown,
            )
            .await
            .into_diagnostic()
            .wrap_err_with(|| format!("watching {}", diff.path.display()))?;

            if live {
                println!();
            }
        }
        Some(Command::Init { ref path }) => {
            let target = path.join(CONFIG_FILE_NAME);
            if target.exists() {
                miette::bail!("{} already exists", target.display());
            }
            std::fs::write(&target, DEFAULT_CONFIG)
                .into_diagnostic()
                .wrap_err_with(|| format!("writing {}", target.display()))?;
            println!("Created {} with default configuration", target.display());
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "diff-nanny", &mut std::io::stdout());
        }
    }

    Ok(())
}
