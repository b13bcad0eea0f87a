use thiserror::Error;

#[derive(Error, Debug)]
pub enum BasketError {
    #[error("Item already recorded: \"{title}\" by {author}")]
    DuplicateItem { title: String, author: String },

    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfig { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Checkout failed: {message}")]
    Checkout { message: String },

    #[error("Mail delivery failed: {message}")]
    Mail { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BasketError {
    pub fn duplicate(item: &crate::domain::model::Item) -> Self {
        BasketError::DuplicateItem {
            title: item.title.clone(),
            author: item.author.clone(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, BasketError::DuplicateItem { .. })
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, BasketError::Authentication { .. })
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            BasketError::DuplicateItem { .. } => ErrorSeverity::Low,
            BasketError::Http(_) | BasketError::Checkout { .. } | BasketError::Mail { .. } => {
                ErrorSeverity::Medium
            }
            BasketError::Config { .. }
            | BasketError::MissingConfig { .. }
            | BasketError::InvalidConfigValue { .. }
            | BasketError::Validation { .. } => ErrorSeverity::High,
            BasketError::Authentication { .. }
            | BasketError::Io(_)
            | BasketError::Serialization(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            BasketError::DuplicateItem { .. } => "No action needed, the item was skipped",
            BasketError::Authentication { .. } => {
                "Check the account email and password in the config file"
            }
            BasketError::Http(_) => "Check the network connection and the shop URLs, then retry",
            BasketError::Io(_) => "Check that the ledger path exists and is writable",
            BasketError::Serialization(_) => {
                "The ledger file is corrupt; restore it from a backup or fix the JSON by hand"
            }
            BasketError::Config { .. }
            | BasketError::MissingConfig { .. }
            | BasketError::InvalidConfigValue { .. } => "Fix the config file and run again",
            BasketError::Validation { .. } => "Inspect the shop response; the site layout may have changed",
            BasketError::Checkout { .. } => {
                "Items are in the basket; open the basket in a browser to pay"
            }
            BasketError::Mail { .. } => "Check the [mail] section; items are already in the basket",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            BasketError::Authentication { .. } => "Could not log in to the shop".to_string(),
            BasketError::Serialization(_) => "Could not read the purchase ledger".to_string(),
            BasketError::Io(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BasketError>;
