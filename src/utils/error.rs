use thiserror::Error;

#[derive(Error, Debug)]
pub enum DegradationError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("XML parsing error: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttrError(#[from] quick_xml::events::attributes::AttrError),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Authentication failed: {message}")]
    AuthError { message: String },

    #[error("Server returned {status}: {message}")]
    ServerError { status: u16, message: String },

    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

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
}

impl DegradationError {
    /// 使用者輸入錯誤（參數或設定檔），應在任何網路呼叫之前結束
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            DegradationError::ConfigError { .. }
                | DegradationError::MissingConfigError { .. }
                | DegradationError::InvalidConfigValueError { .. }
        )
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_usage_error() {
            2
        } else {
            1
        }
    }
}

pub type Result<T> = std::result::Result<T, DegradationError>;
