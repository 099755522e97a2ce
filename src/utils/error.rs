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

    #[error("Backend rejected request (code {code}): {message}")]
    BackendError { code: i64, message: String },

    #[error("Unexpected backend response: {message}")]
    ResponseFormatError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Validation error in '{field}': {message}")]
    ValidationError { field: String, message: String },

    #[error("Cannot leave step '{step}': {message}")]
    StepNavigationError { step: String, message: String },

    #[error("Retry rejected for '{item_id}': {reason}")]
    RetryRejected { item_id: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Backend,
    Configuration,
    Validation,
    Io,
    Workflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ProvisionError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) => ErrorCategory::Network,
            Self::BackendError { .. } | Self::ResponseFormatError { .. } => ErrorCategory::Backend,
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::ValidationError { .. } | Self::StepNavigationError { .. } => ErrorCategory::Validation,
            Self::CsvError(_) | Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Io,
            Self::RetryRejected { .. } => ErrorCategory::Workflow,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Workflow => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Backend => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Validation => ErrorSeverity::High,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    /// 給操作員看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(e) if e.is_timeout() => "请求超时，请检查网络后重试".to_string(),
            Self::ApiError(e) if e.is_connect() => "无法连接到后台服务".to_string(),
            Self::ApiError(e) => match e.status() {
                Some(status) => format!("后台返回 HTTP {}", status.as_u16()),
                None => "网络请求失败".to_string(),
            },
            Self::BackendError { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::BackendError { code, .. } => format!("后台处理失败 (code {})", code),
            Self::ResponseFormatError { .. } => "后台返回了无法识别的数据".to_string(),
            Self::ValidationError { message, .. } => message.clone(),
            Self::StepNavigationError { message, .. } => message.clone(),
            Self::RetryRejected { reason, .. } => reason.clone(),
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the api.base_url setting and network connectivity, then retry",
            ErrorCategory::Backend => "Inspect the backend message; fix the request data or retry the failed items",
            ErrorCategory::Configuration => "Fix the request file and run again",
            ErrorCategory::Validation => "Correct the highlighted field before submitting",
            ErrorCategory::Io => "Check file paths and permissions",
            ErrorCategory::Workflow => "Wait for running items to finish, or retry the prerequisite first",
        }
    }
}

pub type Result<T> = std::result::Result<T, ProvisionError>;
