use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Document store rejected the request (HTTP {status}): {message}")]
    Store { status: u16, message: String },

    #[error("Could not obtain an access token: {message}")]
    AuthError { message: String },

    #[error("Could not decode document: {message}")]
    DecodeError { message: String },

    #[error("Record '{label}' in '{collection}' has no string `id` field")]
    MissingIdentifier { collection: String, label: String },

    #[error("Dataset '{path}' is unusable: {message}")]
    DatasetError { path: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl SyncError {
    pub fn decode(message: impl Into<String>) -> Self {
        SyncError::DecodeError {
            message: message.into(),
        }
    }

    /// Short message for the terminal, without the nested source chain.
    pub fn user_friendly_message(&self) -> String {
        match self {
            SyncError::ApiError(_) => "Could not reach the document store".to_string(),
            SyncError::IoError(e) => format!("File access failed: {}", e),
            SyncError::DatasetError { path, .. } => format!("Could not load dataset {}", path),
            SyncError::MissingConfigError { field } => format!("{} is not configured", field),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            SyncError::ApiError(_) => "Check network access and the --endpoint / --emulator-host settings",
            SyncError::Store { status: 401, .. } | SyncError::Store { status: 403, .. } => {
                "Check the service account's roles, or provide a valid --access-token"
            }
            SyncError::AuthError { .. } => {
                "Check the private_key and client_email in the credentials file"
            }
            SyncError::Store { .. } => "Inspect the store response above",
            SyncError::IoError(_) | SyncError::DatasetError { .. } => {
                "Check that the dataset and credentials files exist and are readable"
            }
            SyncError::DecodeError { .. } => "Make sure the file contains valid JSON",
            SyncError::MissingIdentifier { .. } => "Give every record a string `id` field",
            SyncError::UrlError(_)
            | SyncError::ConfigError { .. }
            | SyncError::MissingConfigError { .. }
            | SyncError::InvalidConfigValueError { .. } => {
                "Review the command-line options and the --config file"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
