use std::env;
use std::sync::Once;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "KIFU_LOG";
const DEFAULT_LEVEL: &str = "warn";

static INIT: Once = Once::new();

/// Installs the stderr subscriber. Level comes from `KIFU_LOG`
/// (any `EnvFilter` directive, e.g. `debug` or `kifu::notes=info`).
pub fn init() {
    INIT.call_once(|| {
        let filter = env::var(LOG_ENV)
            .ok()
            .and_then(|s| EnvFilter::try_new(s.trim()).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

pub fn error(msg: impl AsRef<str>) {
    tracing::error!("{}", msg.as_ref());
}

pub fn warn(msg: impl AsRef<str>) {
    tracing::warn!("{}", msg.as_ref());
}

pub fn info(msg: impl AsRef<str>) {
    tracing::info!("{}", msg.as_ref());
}

pub fn debug(msg: impl AsRef<str>) {
    tracing::debug!("{}", msg.as_ref());
}
