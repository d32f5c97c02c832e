use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tashreef_core::api::GENERATE_PATH;
use tashreef_core::MAX_PROMPT_CHARS;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the generation service.
    pub service_url: String,
    pub generate_path: String,
    /// How long success/failure notifications stay up.
    pub notification_window_ms: u64,
    pub max_prompt_chars: usize,
    /// JSON file backing device-local storage. `None` keeps identity in memory only.
    pub storage_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            generate_path: GENERATE_PATH.to_string(),
            notification_window_ms: 5_000,
            max_prompt_chars: MAX_PROMPT_CHARS,
            storage_path: None,
        }
    }
}

impl ClientConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let s = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let cfg: ClientConfig = toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let s = toml::to_string_pretty(self).with_context(|| "serialize toml")?;
        std::fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
        Ok(())
    }

    pub fn notification_window(&self) -> Duration {
        Duration::from_millis(self.notification_window_ms)
    }
}
