//! Store health probe.
//!
//! Independent of any [`crate::Cache`]: it talks to the backend directly with a
//! single read of a fixed key and reports how long that took.

use crate::backend::CacheBackend;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Key read by the probe. Its value, if any, is ignored.
pub const PROBE_KEY: &str = "__health_check__";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Result of one probe, serializable as health-endpoint details.
///
/// ```json
/// {"status":"UP","key":"__health_check__","latency_ms":1}
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: HealthStatus,
    pub key: String,
    pub latency_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Health {
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Health probe over a store backend.
#[derive(Clone)]
pub struct HealthProbe<B: CacheBackend> {
    backend: B,
}

impl<B: CacheBackend> HealthProbe<B> {
    pub fn new(backend: B) -> Self {
        HealthProbe { backend }
    }

    /// Probe the store.
    ///
    /// UP when the read succeeds (hit or miss), DOWN with the error otherwise.
    pub async fn check(&self) -> Health {
        let start = Instant::now();
        let result = self.backend.get(PROBE_KEY).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => Health {
                status: HealthStatus::Up,
                key: PROBE_KEY.to_string(),
                latency_ms,
                error: None,
            },
            Err(e) => {
                warn!("Store health check failed after {}ms: {}", latency_ms, e);
                Health {
                    status: HealthStatus::Down,
                    key: PROBE_KEY.to_string(),
                    latency_ms,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
