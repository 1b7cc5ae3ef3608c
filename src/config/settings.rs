use crate::config::credentials::ServiceAccountKey;
use crate::config::toml_config::SyncConfig;
use crate::domain::model::ServiceAccount;
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, SyncError};
use crate::utils::validation::{self, Validate};

pub const DEFAULT_ARTISANS_PATH: &str = "./artisans.json";
pub const DEFAULT_REVIEWS_PATH: &str = "./reviews.json";
pub const DEFAULT_CREDENTIALS_PATH: &str = "./serviceAccountKey.json";
pub const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_ENDPOINT: &str = "https://firestore.googleapis.com";
/// Bearer token the Firestore emulator accepts as an administrator.
pub const EMULATOR_TOKEN: &str = "owner";

/// Values given on the command line or through the environment. They win
/// over the `--config` file, which wins over the defaults above.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub artisans_path: Option<String>,
    pub reviews_path: Option<String>,
    pub credentials_path: Option<String>,
    pub project_id: Option<String>,
    pub database: Option<String>,
    pub endpoint: Option<String>,
    pub emulator_host: Option<String>,
    pub access_token: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataPaths {
    pub artisans: String,
    pub reviews: String,
}

impl DataPaths {
    pub fn resolve(overrides: &SettingsOverrides, file: Option<&SyncConfig>) -> Result<Self> {
        let data = file.map(|config| &config.data);
        let paths = Self {
            artisans: pick(
                &overrides.artisans_path,
                data.and_then(|d| d.artisans_path.as_ref()),
                DEFAULT_ARTISANS_PATH,
            ),
            reviews: pick(
                &overrides.reviews_path,
                data.and_then(|d| d.reviews_path.as_ref()),
                DEFAULT_REVIEWS_PATH,
            ),
        };
        paths.validate()?;
        Ok(paths)
    }
}

impl Validate for DataPaths {
    fn validate(&self) -> Result<()> {
        validation::validate_path("artisans", &self.artisans)?;
        validation::validate_file_extension("artisans", &self.artisans, &["json"])?;
        validation::validate_path("reviews", &self.reviews)?;
        validation::validate_file_extension("reviews", &self.reviews, &["json"])?;
        Ok(())
    }
}

/// Everything needed to reach the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSettings {
    pub project_id: String,
    pub database: String,
    pub endpoint: String,
    pub access_token: Option<String>,
    pub service_account: Option<ServiceAccount>,
    pub timeout_seconds: Option<u64>,
    pub emulator: bool,
}

impl StoreSettings {
    pub fn resolve(overrides: &SettingsOverrides, file: Option<&SyncConfig>) -> Result<Self> {
        let store = file.map(|config| &config.store);
        let emulator_host = overrides
            .emulator_host
            .clone()
            .or_else(|| store.and_then(|s| s.emulator_host.clone()))
            .filter(|host| !host.trim().is_empty());

        let endpoint = match &emulator_host {
            Some(host) => format!("http://{}", host),
            None => pick(
                &overrides.endpoint,
                store.and_then(|s| s.endpoint.as_ref()),
                DEFAULT_ENDPOINT,
            ),
        };

        let credentials_path = pick(
            &overrides.credentials_path,
            store.and_then(|s| s.credentials_path.as_ref()),
            DEFAULT_CREDENTIALS_PATH,
        );

        let mut project_id = overrides
            .project_id
            .clone()
            .or_else(|| store.and_then(|s| s.project_id.clone()));
        let mut access_token = overrides
            .access_token
            .clone()
            .or_else(|| store.and_then(|s| s.access_token.clone()));
        let mut service_account = None;

        if project_id.is_none() || (access_token.is_none() && emulator_host.is_none()) {
            match ServiceAccountKey::from_file(&credentials_path) {
                Ok(key) => {
                    tracing::debug!(
                        "Loaded credentials for {}",
                        key.client_email.as_deref().unwrap_or("<unknown account>")
                    );
                    access_token = access_token.or_else(|| key.access_token.clone());
                    // A fixed token or the emulator means nothing is minted.
                    if access_token.is_none() && emulator_host.is_none() {
                        service_account = key.service_account();
                    }
                    project_id = project_id.or(key.project_id);
                }
                // The key file is only mandatory when it is the sole source of the project id.
                Err(e) if project_id.is_none() => return Err(e),
                Err(e) => tracing::debug!("Ignoring credentials file: {}", e),
            }
        }

        if emulator_host.is_some() {
            access_token = access_token.or_else(|| Some(EMULATOR_TOKEN.to_string()));
        } else if let Some(account) = &service_account {
            tracing::debug!("Access tokens will be minted for {}", account.client_email);
        } else if access_token.is_none() {
            tracing::warn!(
                "No access token or service account key configured; requests to {} will be unauthenticated",
                endpoint
            );
        }

        let settings = Self {
            project_id: validation::validate_required_field("project_id", &project_id)?.clone(),
            database: pick(
                &overrides.database,
                store.and_then(|s| s.database.as_ref()),
                DEFAULT_DATABASE,
            ),
            endpoint,
            access_token,
            service_account,
            timeout_seconds: overrides
                .timeout_seconds
                .or_else(|| store.and_then(|s| s.timeout_seconds)),
            emulator: emulator_host.is_some(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

impl Validate for StoreSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("project_id", &self.project_id)?;
        validation::validate_non_empty_string("database", &self.database)?;
        validation::validate_url("endpoint", &self.endpoint)?;
        if let Some(timeout) = self.timeout_seconds {
            validation::validate_range("timeout", timeout, 1, 3600)?;
        }
        if self.project_id.contains('/') {
            return Err(SyncError::InvalidConfigValueError {
                field: "project_id".to_string(),
                value: self.project_id.clone(),
                reason: "Project id cannot contain '/'".to_string(),
            });
        }
        Ok(())
    }
}

impl ConfigProvider for StoreSettings {
    fn project_id(&self) -> &str {
        &self.project_id
    }

    fn database(&self) -> &str {
        &self.database
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn service_account(&self) -> Option<&ServiceAccount> {
        self.service_account.as_ref()
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.timeout_seconds
    }
}

fn pick(cli: &Option<String>, file: Option<&String>, default: &str) -> String {
    cli.clone()
        .or_else(|| file.cloned())
        .unwrap_or_else(|| default.to_string())
}
