//! Logging configuration using tracing.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Transport crates that are noisy at `info` (sqlx logs every statement).
/// They only follow the main level down to `debug` when `debug` is set.
const TRANSPORT_TARGETS: [&str; 3] = ["reqwest", "hyper_util", "sqlx"];

/// Filter directives for `level`, with the transport targets pinned to
/// `debug` or `warn` depending on the debug flag.
pub fn directives(level: &str, debug: bool) -> String {
    let transport = if debug { "debug" } else { "warn" };
    let mut directives = vec![level.to_string()];
    directives.extend(
        TRANSPORT_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, transport)),
    );
    directives.join(",")
}

/// Initialize logging. `RUST_LOG` takes precedence over `level` and `debug`.
pub fn init(level: &str, debug: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directives(level, debug)))
        .unwrap_or_else(|_| EnvFilter::new(directives("info", debug)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(debug))
        .try_init()?;

    Ok(())
}
