use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// `RUST_LOG` when set, otherwise `warn` (or `debug` with `--debug`), with
/// the driver kept quiet.
fn build_env_filter(debug: bool) -> anyhow::Result<EnvFilter> {
    if !debug {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
    }
    let level = if debug { "debug" } else { "warn" };
    let directives = format!("{level},oracle=warn");
    EnvFilter::try_new(&directives)
        .map_err(|e| anyhow::anyhow!("invalid tracing filter '{directives}': {e}"))
}

/// Install the stderr subscriber. Stdout is reserved for prompts.
pub fn init_logging(debug: bool) -> anyhow::Result<()> {
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(debug)
        .without_time();

    tracing_subscriber::registry()
        .with(layer)
        .with(build_env_filter(debug)?)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install logger: {e}"))?;

    let verbose = debug;
    tracing::trace!(verbose, "logging initialized");
    Ok(())
}
