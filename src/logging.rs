/// Tracing subscriber setup for the telemetry service.
///
/// Call once from the hosting binary. Verbosity follows `RUST_LOG`
/// (e.g. `RUST_LOG=rivertel_service=debug`), defaulting to `info`.
/// Fetch failures are logged at `warn` with site and metric fields by the
/// router; successful fetches at `debug`.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Ignore the error if a subscriber is already installed (tests, or an
    // embedding application with its own setup).
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
