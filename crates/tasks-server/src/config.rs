//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address. A bare `:port` binds every interface.
    pub bind: String,
    /// Per-request deadline in seconds.
    pub request_timeout_secs: u64,
    /// How long shutdown waits for in-flight requests before aborting.
    pub shutdown_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:5000".into(),
            request_timeout_secs: 2,
            shutdown_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Address suitable for `TcpListener::bind`.
    pub fn bind_addr(&self) -> String {
        normalize_bind(&self.bind)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

/// Expand `":5000"` into `"0.0.0.0:5000"`. Anything else passes through.
pub fn normalize_bind(bind: &str) -> String {
    let trimmed = bind.trim();
    if trimmed.starts_with(':') {
        format!("0.0.0.0{trimmed}")
    } else {
        trimmed.to_string()
    }
}
