//! Logging setup.
//!
//! Logs go to stderr so streamed answers on stdout stay clean. The level
//! comes from `RUST_LOG` and defaults to `info`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. Set `json` for one JSON object per line.
///
/// Returns an error if a global subscriber was already installed.
pub fn try_init(json: bool) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (text_layer, json_layer) = if json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_target(false).with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry().with(env_filter).with(text_layer).with(json_layer).try_init()
}

/// Like [`try_init`], ignoring an already-installed subscriber.
pub fn init(json: bool) {
    let _ = try_init(json);
}
