// Application state management

use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::engine::{EngineSnapshot, PredictionEngine};

/// No outer lock: the engine serializes writers per market internally.
pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub engine: PredictionEngine,
    pub config: EngineConfig,
}

impl AppState {
    /// Start from the persisted snapshot when one exists, fresh otherwise
    pub fn new(config: EngineConfig) -> Result<Self, String> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: EngineConfig, clock: Arc<dyn Clock>) -> Result<Self, String> {
        info!("🚀 Initializing prediction market engine...");

        let engine = match config.state_path.as_deref() {
            Some(path) if path.exists() => {
                let snapshot = load_from_disk(path)?;
                let engine = PredictionEngine::from_snapshot(snapshot, clock, config.activity_capacity)
                    .map_err(|e| format!("Failed to restore state from {}: {}", path.display(), e))?;
                info!(
                    path = %path.display(),
                    markets = engine.store().len(),
                    "✅ Loaded persisted state from disk"
                );
                engine
            }
            _ => {
                info!("ℹ️  No persisted state found, starting fresh");
                PredictionEngine::new(clock, config.activity_capacity)
            }
        };

        Ok(Self { engine, config })
    }

    /// Write the full engine snapshot to the configured path. No-op when
    /// persistence is disabled.
    pub fn save_to_disk(&self) -> Result<(), String> {
        let path = match self.config.state_path.as_deref() {
            Some(path) => path,
            None => {
                warn!("persistence disabled, state not saved");
                return Ok(());
            }
        };

        let json = serde_json::to_string_pretty(&self.engine.snapshot())
            .map_err(|e| format!("Failed to serialize state: {}", e))?;

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create {}: {}", dir.display(), e))?;
        }
        // write beside the target and rename, so a crash never leaves a torn snapshot
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| format!("Failed to write state file: {}", e))?;
        fs::rename(&tmp, path)
            .map_err(|e| format!("Failed to move {} into place: {}", tmp.display(), e))?;

        info!(path = %path.display(), "💾 State saved to disk");
        Ok(())
    }
}

fn load_from_disk(path: &Path) -> Result<EngineSnapshot, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read state file {}: {}", path.display(), e))?;
    serde_json::from_str(&json).map_err(|e| format!("Failed to deserialize state: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::path::PathBuf;

    fn temp_state_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("prediction-market-{}-{}", name, uuid::Uuid::new_v4().simple()))
            .join("state.json")
    }

    fn config_at(path: Option<PathBuf>) -> EngineConfig {
        EngineConfig { state_path: path, ..EngineConfig::default() }
    }

    #[test]
    fn test_save_and_reload() {
        let path = temp_state_path("reload");
        let clock = Arc::new(ManualClock::new(1_000));

        let state = AppState::with_clock(config_at(Some(path.clone())), clock.clone()).unwrap();
        let id = state.engine.create_market("Persisted?", 5_000, "alice").unwrap();
        state.engine.place_bet(id, "bob", false, 12).unwrap();
        state.save_to_disk().unwrap();

        let reloaded = AppState::with_clock(config_at(Some(path.clone())), clock).unwrap();
        let market = reloaded.engine.get_market(id).unwrap();
        assert_eq!(market.market.no_pool(), 12);
        assert_eq!(reloaded.engine.get_user_bets(id, "bob").len(), 1);
        assert_eq!(reloaded.engine.history("alice", 5).len(), 1);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_save_replaces_snapshot_without_leftovers() {
        let path = temp_state_path("replace");
        let clock = Arc::new(ManualClock::new(1_000));

        let state = AppState::with_clock(config_at(Some(path.clone())), clock.clone()).unwrap();
        state.engine.create_market("First?", 5_000, "alice").unwrap();
        state.save_to_disk().unwrap();
        state.engine.create_market("Second?", 5_000, "alice").unwrap();
        state.save_to_disk().unwrap();

        assert!(!path.with_extension("json.tmp").exists());
        let reloaded = AppState::with_clock(config_at(Some(path.clone())), clock).unwrap();
        assert_eq!(reloaded.engine.store().len(), 2);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_corrupt_state_file_is_an_error() {
        let path = temp_state_path("corrupt");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        let result = AppState::with_clock(config_at(Some(path.clone())), Arc::new(ManualClock::new(0)));
        assert!(result.is_err());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_persistence_disabled() {
        let state = AppState::with_clock(config_at(None), Arc::new(ManualClock::new(0))).unwrap();
        assert!(state.save_to_disk().is_ok());
    }
}
