//! Pipeline configuration loaded from environment variables.

use std::time::Duration;

use crate::idempotency::DEFAULT_RETENTION;
use crate::processor::DEFAULT_MAX_RETRIES;

/// Processor configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `LEDGER_NODE_ID` — this node's id for leader coordination (default: `"local"`)
/// - `LEDGER_MAX_CONFLICT_RETRIES` — bound on reload-and-retry attempts (default: `3`)
/// - `LEDGER_IDEMPOTENCY_TTL_SECS` — idempotency retention window (default: 24h)
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    pub node_id: String,
    pub max_retries: u32,
    pub idempotency_retention: Duration,
}

impl ProcessorConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            node_id: std::env::var("LEDGER_NODE_ID").unwrap_or_else(|_| "local".to_string()),
            max_retries: std::env::var("LEDGER_MAX_CONFLICT_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_RETRIES),
            idempotency_retention: std::env::var("LEDGER_IDEMPOTENCY_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_RETENTION),
        }
    }
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            node_id: "local".to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            idempotency_retention: DEFAULT_RETENTION,
        }
    }
}
