pub mod cli;
pub mod credentials;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "cli")]
use settings::SettingsOverrides;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "cli", derive(ValueEnum))]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "artisan-sync")]
#[command(about = "Load, clear and inspect the artisans and reviews collections in Cloud Firestore")]
pub struct CliConfig {
    /// add | artisans | reviews | delete | show (anything else prints usage)
    pub command: Option<String>,

    /// TOML settings file
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long, help = "Artisans dataset (default ./artisans.json)")]
    pub artisans: Option<String>,

    #[arg(long, help = "Reviews dataset (default ./reviews.json)")]
    pub reviews: Option<String>,

    #[arg(long, env = "ARTISAN_SYNC_CREDENTIALS", help = "Service account key file")]
    pub credentials: Option<String>,

    #[arg(long)]
    pub project_id: Option<String>,

    #[arg(long, help = "Firestore database id (default \"(default)\")")]
    pub database: Option<String>,

    #[arg(long, env = "FIRESTORE_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long, env = "FIRESTORE_EMULATOR_HOST")]
    pub emulator_host: Option<String>,

    #[arg(
        long,
        env = "FIRESTORE_ACCESS_TOKEN",
        hide_env_values = true,
        help = "Fixed bearer token, used instead of minting one from the key file"
    )]
    pub access_token: Option<String>,

    #[arg(long, help = "Per-request timeout in seconds")]
    pub timeout: Option<u64>,

    #[arg(long, help = "Run against an in-memory store instead of Firestore")]
    pub dry_run: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            artisans_path: self.artisans.clone(),
            reviews_path: self.reviews.clone(),
            credentials_path: self.credentials.clone(),
            project_id: self.project_id.clone(),
            database: self.database.clone(),
            endpoint: self.endpoint.clone(),
            emulator_host: self.emulator_host.clone(),
            access_token: self.access_token.clone(),
            timeout_seconds: self.timeout,
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_command_token_is_accepted() {
        let config = CliConfig::try_parse_from(["artisan-sync", "bogus"]).unwrap();
        assert_eq!(config.command.as_deref(), Some("bogus"));
        assert!(!config.dry_run);
    }

    #[test]
    fn test_overrides_carry_cli_values() {
        let config = CliConfig::try_parse_from([
            "artisan-sync",
            "show",
            "--artisans",
            "seed/artisans.json",
            "--project-id",
            "souq-crafts",
            "--timeout",
            "10",
            "--log-format",
            "json",
        ])
        .unwrap();

        let overrides = config.overrides();
        assert_eq!(overrides.artisans_path.as_deref(), Some("seed/artisans.json"));
        assert_eq!(overrides.project_id.as_deref(), Some("souq-crafts"));
        assert_eq!(overrides.timeout_seconds, Some(10));
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
