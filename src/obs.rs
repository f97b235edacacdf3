//! Observability helpers.

use sha2::{Digest, Sha256};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber.
///
/// Honors `RUST_LOG`; falls back to debug output for this crate and
/// `tower_http`.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_simulador_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Short stable tag for personal data (contacts, e-mails) in log lines.
///
/// Case and surrounding whitespace are ignored so the same contact always
/// maps to the same tag.
pub fn fingerprint(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.trim().to_lowercase().as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..12].to_string()
}
