use crate::error::{CancerXError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// APIキーを読む環境変数（先頭優先）
const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub model: String,
    pub api_base_url: String,
    pub timeout_seconds: u64,
    /// 同時に走らせるファイル解析の上限
    pub max_concurrent_analyses: usize,
    pub synthesis_temperature: f32,
    pub chat_temperature: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeout_seconds: 120,
            max_concurrent_analyses: 4,
            synthesis_temperature: 0.1,
            chat_temperature: 0.2,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CancerXError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("cancerx").join("config.json"))
    }

    pub fn get_api_key(&self) -> Result<String> {
        // 環境変数を優先
        for var in API_KEY_ENV_VARS {
            if let Ok(key) = std::env::var(var) {
                if !key.trim().is_empty() {
                    return Ok(key);
                }
            }
        }

        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(CancerXError::MissingApiKey)
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }

    pub fn set_model(&mut self, model: String) -> Result<()> {
        self.model = model;
        self.save()
    }

    /// 0 を指定されても最低1件は解析できるようにする
    pub fn analysis_concurrency(&self) -> usize {
        self.max_concurrent_analyses.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_returns_default() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("none.json")).unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_concurrent_analyses, 4);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cancerx").join("config.json");

        let config = Config {
            api_key: Some("secret".into()),
            model: "gemini-2.5-pro".into(),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.model, "gemini-2.5-pro");

        // 欠けたフィールドはデフォルトで補う
        std::fs::write(&path, r#"{"model": "custom"}"#).unwrap();
        let partial = Config::load_from(&path).unwrap();
        assert_eq!(partial.model, "custom");
        assert_eq!(partial.timeout_seconds, 120);
    }

    #[test]
    fn test_analysis_concurrency_minimum() {
        let config = Config {
            max_concurrent_analyses: 0,
            ..Default::default()
        };
        assert_eq!(config.analysis_concurrency(), 1);
    }
}
