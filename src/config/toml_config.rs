use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Optional settings file passed with `--config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub data: DataSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSection {
    pub project_id: Option<String>,
    pub database: Option<String>,
    pub endpoint: Option<String>,
    pub emulator_host: Option<String>,
    pub access_token: Option<String>,
    pub credentials_path: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSection {
    pub artisans_path: Option<String>,
    pub reviews_path: Option<String>,
}

impl SyncConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SyncError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SyncError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${FIRESTORE_ACCESS_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SyncError::ConfigError {
            message: format!("placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for SyncConfig {
    fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.store.endpoint {
            validation::validate_url("store.endpoint", endpoint)?;
        }
        if let Some(database) = &self.store.database {
            validation::validate_non_empty_string("store.database", database)?;
        }
        if let Some(path) = &self.store.credentials_path {
            validation::validate_path("store.credentials_path", path)?;
        }
        if let Some(timeout) = self.store.timeout_seconds {
            validation::validate_range("store.timeout_seconds", timeout, 1, 3600)?;
        }
        if let Some(path) = &self.data.artisans_path {
            validation::validate_path("data.artisans_path", path)?;
        }
        if let Some(path) = &self.data.reviews_path {
            validation::validate_path("data.reviews_path", path)?;
        }
        Ok(())
    }
}
