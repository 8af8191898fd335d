// src/monitoring/logging.rs
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

fn env_filter() -> EnvFilter {
    // RUST_LOG, sinon "info".
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installe le subscriber global. `json` pour les logs machine (une ligne par événement),
/// sinon format texte lisible. Les logs partent sur stderr : stdout reste réservé aux résultats.
pub fn setup_logging(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_span_events(FmtSpan::CLOSE)
        .with_target(true)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
