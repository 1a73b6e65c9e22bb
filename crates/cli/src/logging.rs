//! Structured logging for the `pacs` binary.
//!
//! Logs go to stderr so that command output on stdout stays machine-readable.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingSettings;

/// Install the global subscriber. `RUST_LOG` takes precedence over
/// `settings.level`, which applies to the workspace crates only.
pub(crate) fn init(settings: &LoggingSettings) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &settings.level;
        EnvFilter::new(format!(
            "pacs_hl7={},pacs_pix={},pacs_stgcmt={},pacs_storage={},pacs_cli={}",
            level, level, level, level, level
        ))
    });

    if settings.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true);
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    } else {
        let fmt_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init();
    }
}
