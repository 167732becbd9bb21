// Runtime configuration, read from the environment (and `.env` when present)

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::activity::DEFAULT_ACTIVITY_CAPACITY;

pub const DEFAULT_PORT: u16 = 1234;
pub const DEFAULT_STATE_PATH: &str = "data/state.json";
pub const DEFAULT_LOG_FILTER: &str = "prediction_market=info,tower_http=info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub bind_addr: SocketAddr,
    /// Snapshot file; `None` disables persistence
    pub state_path: Option<PathBuf>,
    pub activity_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            state_path: Some(PathBuf::from(DEFAULT_STATE_PATH)),
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self, String> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, so tests don't have to touch the process env
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr
                .parse()
                .map_err(|e| format!("BIND_ADDR '{}' is not a socket address: {}", addr, e))?;
        }

        if let Some(path) = lookup("STATE_PATH") {
            let path = path.trim();
            config.state_path = if path.is_empty() { None } else { Some(PathBuf::from(path)) };
        }

        if let Some(capacity) = lookup("ACTIVITY_CAPACITY") {
            config.activity_capacity = match capacity.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(format!(
                        "ACTIVITY_CAPACITY '{}' must be a positive integer",
                        capacity
                    ))
                }
            };
        }

        Ok(config)
    }
}
