use crate::adapters::html::PageLayout;
use crate::adapters::http::{
    SessionOptions, ShopEndpoints, DEFAULT_LOGIN_FAILURE_MARKER, DEFAULT_USER_AGENT,
};
use crate::adapters::pacing::{Pacer, UrlTemplate, PAGE_PLACEHOLDER};
use crate::core::driver::{DriverSettings, DEFAULT_MAX_CYCLES};
use crate::core::selection::TitleFilter;
use crate::domain::model::RunMode;
use crate::utils::error::{BasketError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub shop: ShopConfig,
    pub account: AccountConfig,
    pub purchase: PurchaseConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
    pub mail: Option<MailConfig>,
    pub layout: Option<PageLayout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopConfig {
    pub base_url: String,
    pub login_url: String,
    pub basket_url: String,
    /// Catalog page URL with a `$PAGE$` placeholder.
    pub page_url: String,
    pub max_page: u32,
    pub request_timeout_seconds: Option<u64>,
    pub max_delay_seconds: Option<f64>,
    pub login_failure_marker: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseConfig {
    /// Stop once the order is worth at least this much.
    pub target_spend: f64,
    /// Items must be strictly cheaper than this.
    pub max_item_price: f64,
    #[serde(default)]
    pub excluded_title_words: Vec<String>,
    pub max_cycles: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub path: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            path: "library.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub recipient: String,
    pub sender: String,
    pub smtp_host: String,
    pub smtp_port: Option<u16>,
    pub password: String,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(BasketError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| BasketError::Config {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| BasketError::Config {
            message: format!("env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("shop.base_url", &self.shop.base_url)?;
        validation::validate_url("shop.login_url", &self.shop.login_url)?;
        validation::validate_url("shop.basket_url", &self.shop.basket_url)?;
        validation::validate_page_template("shop.page_url", &self.shop.page_url, PAGE_PLACEHOLDER)?;
        if let Some(delay) = self.shop.max_delay_seconds {
            validation::validate_range("shop.max_delay_seconds", delay, 0.0, 60.0)?;
        }
        if let Some(timeout) = self.shop.request_timeout_seconds {
            validation::validate_positive_number("shop.request_timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_non_empty_string("account.email", &self.account.email)?;
        validation::validate_non_empty_string("account.password", &self.account.password)?;

        validation::validate_range("purchase.target_spend", self.purchase.target_spend, 0.0, 10_000.0)?;
        validation::validate_range(
            "purchase.max_item_price",
            self.purchase.max_item_price,
            0.0,
            10_000.0,
        )?;
        if let Some(cycles) = self.purchase.max_cycles {
            validation::validate_positive_number("purchase.max_cycles", cycles, 1)?;
        }
        for word in &self.purchase.excluded_title_words {
            validation::validate_non_empty_string("purchase.excluded_title_words", word)?;
        }

        validation::validate_path("ledger.path", &self.ledger.path)?;

        if let Some(mail) = &self.mail {
            validation::validate_non_empty_string("mail.recipient", &mail.recipient)?;
            validation::validate_non_empty_string("mail.sender", &mail.sender)?;
            validation::validate_non_empty_string("mail.smtp_host", &mail.smtp_host)?;
        }

        self.page_layout().compile()?;
        Ok(())
    }

    pub fn endpoints(&self) -> ShopEndpoints {
        ShopEndpoints {
            base_url: self.shop.base_url.clone(),
            login_url: self.shop.login_url.clone(),
            basket_url: self.shop.basket_url.clone(),
        }
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            timeout: Duration::from_secs(self.shop.request_timeout_seconds.unwrap_or(3)),
            user_agent: self
                .shop
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            login_failure_marker: self
                .shop
                .login_failure_marker
                .clone()
                .unwrap_or_else(|| DEFAULT_LOGIN_FAILURE_MARKER.to_string()),
        }
    }

    pub fn pacer(&self) -> Pacer {
        Pacer::new(Duration::from_secs_f64(self.shop.max_delay_seconds.unwrap_or(3.0)))
    }

    pub fn page_source(&self) -> UrlTemplate {
        UrlTemplate::new(self.shop.page_url.clone(), self.shop.max_page)
    }

    pub fn page_layout(&self) -> PageLayout {
        self.layout.clone().unwrap_or_default()
    }

    pub fn content_filter(&self) -> TitleFilter {
        TitleFilter::new(
            self.purchase.excluded_title_words.clone(),
            self.purchase.max_item_price,
        )
    }

    pub fn driver_settings(&self, mode: RunMode) -> DriverSettings {
        DriverSettings {
            target: self.purchase.target_spend,
            max_cycles: self.purchase.max_cycles.unwrap_or(DEFAULT_MAX_CYCLES),
            mode,
        }
    }

    pub fn ledger_path(&self) -> &str {
        &self.ledger.path
    }

    #[cfg(feature = "mail")]
    pub fn smtp_settings(&self) -> Option<crate::adapters::mail::SmtpSettings> {
        self.mail.as_ref().map(|mail| crate::adapters::mail::SmtpSettings {
            recipient: mail.recipient.clone(),
            sender: mail.sender.clone(),
            smtp_host: mail.smtp_host.clone(),
            smtp_port: mail.smtp_port.unwrap_or(587),
            password: mail.password.clone(),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
