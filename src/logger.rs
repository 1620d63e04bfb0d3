use once_cell::sync::OnceCell;
use tracing_subscriber::{
    fmt, fmt::time::UtcTime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use crate::error::{DeskError, Result};
use crate::settings::config_dir;

static LOGGER_INIT: OnceCell<()> = OnceCell::new();
static LOGGER_GUARD: OnceCell<tracing_appender::non_blocking::WorkerGuard> = OnceCell::new();

const DEFAULT_LOG_DIRECTIVES: &str = "info,desk::store=debug,desk::cache=debug";

/// Install the global subscriber. The log file always receives events. Stderr is
/// added only for non-interactive commands run with `RUST_LOG` set, since the
/// dashboard owns the terminal and notices are already printed.
pub fn init_logging(interactive: bool) -> Result<()> {
    LOGGER_INIT
        .get_or_try_init(|| {
            let log_dir = config_dir().join("logs");
            std::fs::create_dir_all(&log_dir)?;

            let file_appender = tracing_appender::rolling::daily(&log_dir, "dispatch-desk.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            let env_filter = EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new(DEFAULT_LOG_DIRECTIVES))
                .map_err(|err| DeskError::Config(format!("invalid log filter: {err}")))?;

            LOGGER_GUARD
                .set(guard)
                .map_err(|_| DeskError::Other("logger already initialized".into()))?;

            let echo_stderr = !interactive && std::env::var_os("RUST_LOG").is_some();
            let stderr_layer = echo_stderr.then(|| {
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_timer(UtcTime::rfc_3339())
            });

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    fmt::layer()
                        .with_writer(non_blocking)
                        .with_ansi(false)
                        .with_target(true)
                        .with_timer(UtcTime::rfc_3339()),
                )
                .with(stderr_layer)
                .init();

            Ok(())
        })
        .map(|_| ())
}
