use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("{endpoint} returned {status}")]
    HttpStatus { endpoint: String, status: u16 },

    #[error("Requester not found in directory: {login}")]
    RequesterNotFound { login: String },

    #[error("Authorization failed: {message}")]
    AuthError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Authorization,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProvisionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::HttpStatus { .. } => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::TomlError(_) => ErrorCategory::Configuration,
            Self::CsvError(_)
            | Self::SerializationError(_)
            | Self::ValidationError { .. }
            | Self::RequesterNotFound { .. }
            | Self::ProcessingError { .. } => ErrorCategory::Data,
            Self::AuthError { .. } => ErrorCategory::Authorization,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Data => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Authorization => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給操作者的修復建議
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) => "Check network connectivity and the Canvas base URL",
            Self::HttpStatus { status: 401, .. } => "Check that the Canvas token is valid",
            Self::HttpStatus { .. } => "Check the account and term IDs, then try again",
            Self::CsvError(_) => "Make sure the CSV has a header row with the expected columns",
            Self::IoError(_) => "Check that the file exists and is readable",
            Self::SerializationError(_) => "The server returned an unexpected response body",
            Self::TomlError(_) => "Make sure the config file is valid TOML",
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => "Fix the configuration file and rerun",
            Self::ValidationError { .. } => "Check the data and try again",
            Self::RequesterNotFound { .. } => "Verify the requester has a Canvas account",
            Self::AuthError { .. } => "Delete the token cache and authorize again",
            Self::ProcessingError { .. } => "Check the data and try again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not reach Canvas: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Bad input data: {}", self),
            ErrorCategory::Authorization => format!("Spreadsheet authorization failed: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
