//! # Ledger Telemetry
//!
//! Structured logging for the invoice ledger, built on `tracing`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ledger_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `invoice-ledger` | Service name stamped on every log line |
//! | `LEDGER_LOG_LEVEL` / `RUST_LOG` | `info` | `EnvFilter` directive |
//! | `LEDGER_JSON_LOGS` | `false` (`true` in containers) | JSON output |
//! | `LEDGER_CONSOLE_OUTPUT` | `true` | Emit logs to stderr at all |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::build_filter;

use thiserror::Error;

/// Telemetry initialization errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter {directive:?}: {message}")]
    Filter { directive: String, message: String },

    #[error("Failed to install global subscriber: {0}")]
    SubscriberInit(String),
}

/// Install the global `tracing` subscriber.
///
/// Call once per process. Hold the returned guard for the lifetime of the
/// application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    logging::init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        level = %config.log_level,
        json = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Keeps telemetry alive; logs shutdown on drop.
#[derive(Debug)]
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}

/// Span carrying the ledger component name.
///
/// ```rust,ignore
/// let _span = ledger_telemetry::ledger_span!("register", component = "registry", entity_id = 42).entered();
/// ```
#[macro_export]
macro_rules! ledger_span {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Log a block event with index and hash fields.
#[macro_export]
macro_rules! log_block_event {
    ($level:ident, $msg:expr, $block_index:expr, $block_hash:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            block_index = $block_index,
            block_hash = %$block_hash,
            $($($field)*,)?
            $msg
        )
    };
}
