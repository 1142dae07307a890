use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Environment variable holding an `EnvFilter` directive, e.g. `debug` or
/// `nanny_difflens=trace`.
pub const LOG_ENV_VAR: &str = "DIFF_NANNY_LOG";

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for the label and JSON output.
pub fn setup_logger(verbose: bool) {
    let env_filter = EnvFilter::builder()
        .with_default_directive(if verbose {
            LevelFilter::DEBUG.into()
        } else {
            LevelFilter::WARN.into()
        })
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let fmt = fmt::layer()
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry().with(fmt).with(env_filter).init();
}
