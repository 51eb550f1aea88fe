//! Structured JSON logging setup. Opt-in: the engine never installs a
//! global subscriber on its own, only when an embedder calls this.

use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

/// Initialize JSON-formatted structured logging gated by `RUST_LOG`
/// (e.g. `"info,cas_engine=debug"`). Safe to call once at process start;
/// calling it again after a subscriber is already installed is a no-op.
pub fn init_json_logging() {
    let fmt_layer = fmt::layer().json().with_current_span(true).with_span_list(true);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default().with(filter).with(fmt_layer);
    let _ = tracing::subscriber::set_global_default(subscriber);
}
