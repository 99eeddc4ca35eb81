//! Environment-driven runtime configuration.
//!
//! Two knobs matter at startup:
//!
//! - `CINEVAULT_STACK_SIZE` — coroutine stack size in bytes, decimal or `0x` hex
//!   (default `0x8000`). Total memory is roughly stack size × concurrent
//!   requests, so tune it down for dense deployments.
//! - `PORT` — listen port when `--addr` is not given (default `1234`).

use std::env;

/// Default CORS allow-list applied when no `--allow-origin` flags are given.
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:8080",
    "http://localhost:1234",
    "https://movies.com",
    "https://midu.dev",
];

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Stack size for handler coroutines in bytes (default: 32 KB / 0x8000)
    pub stack_size: usize,
    /// Listen port used when no bind address is given on the command line
    pub port: u16,
}

const DEFAULT_STACK_SIZE: usize = 0x8000;
const DEFAULT_PORT: u16 = 1234;

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let stack_size = match env::var("CINEVAULT_STACK_SIZE") {
            Ok(val) => {
                if let Some(hex) = val.strip_prefix("0x") {
                    usize::from_str_radix(hex, 16).unwrap_or(DEFAULT_STACK_SIZE)
                } else {
                    val.parse().unwrap_or(DEFAULT_STACK_SIZE)
                }
            }
            Err(_) => DEFAULT_STACK_SIZE,
        };
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        RuntimeConfig { stack_size, port }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            stack_size: DEFAULT_STACK_SIZE,
            port: DEFAULT_PORT,
        }
    }
}
