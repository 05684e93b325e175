//! Tracing initialisation.

use crate::config::{EngineConfig, DEFAULT_LOG_FILTER};
use std::sync::Once;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Install the global subscriber.
///
/// The filter comes from `OBRA_LOG` and falls back to
/// `obra_engine=info` when unset or invalid.  Safe to call more than
/// once; only the first call has an effect.
pub fn init_tracing(config: &EngineConfig) {
    INIT.call_once(|| {
        let filter = config
            .log_filter
            .as_deref()
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

        let registry = tracing_subscriber::registry().with(filter);
        if config.log_json {
            registry.with(fmt::layer().json().with_target(true)).init();
        } else {
            registry.with(fmt::layer().with_target(true)).init();
        }
    });
}
