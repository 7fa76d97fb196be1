//! Environment overrides, applied on top of command-line flags.
//!
//! Invalid values are logged and ignored so that a typo in the environment
//! never prevents startup.

pub const ENV_BIND: &str = "TASKS_BIND";
pub const ENV_DATABASE: &str = "TASKS_DATABASE";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "TASKS_REQUEST_TIMEOUT_SECS";

/// Upper bound accepted for the request timeout.
const MAX_REQUEST_TIMEOUT_SECS: u64 = 3600;

/// Values found in the environment. `None` means "keep the flag value".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub bind: Option<String>,
    pub database: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read overrides through `lookup`, which maps a variable name to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            bind: read_string(&lookup, ENV_BIND),
            database: read_string(&lookup, ENV_DATABASE),
            request_timeout_secs: read_u64(&lookup, ENV_REQUEST_TIMEOUT_SECS, 1, MAX_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

fn read_string(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).filter(|v| !v.is_empty())
}

fn read_u64(lookup: &impl Fn(&str) -> Option<String>, name: &str, min: u64, max: u64) -> Option<u64> {
    let val = lookup(name)?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}
