use crate::adapters::http::ShopSession;
use crate::adapters::mail::{ConsoleNotifier, NotifierChain};
use crate::config::TomlConfig;
use crate::core::driver::{Driver, RunReport};
use crate::core::ledger::Ledger;
use crate::domain::model::RunMode;
use crate::domain::ports::{Notifier, Storage};
use crate::utils::error::Result;

/// One complete run: log in, fill the basket, then tell the operator how to pay.
///
/// The ledger is read from and written to `storage` at `ledger.path`. A live run
/// hands the summary to `notifier` once; a dry run only prints it.
pub async fn run<S, N>(
    config: &TomlConfig,
    mode: RunMode,
    storage: S,
    notifier: &N,
) -> Result<RunReport>
where
    S: Storage,
    N: Notifier + ?Sized,
{
    let mut ledger = Ledger::load(storage, config.ledger_path()).await?;

    let layout = config.page_layout().compile()?;
    let session = ShopSession::new(
        config.endpoints(),
        layout,
        config.pacer(),
        config.session_options(),
    )?;
    session
        .login(&config.account.email, &config.account.password)
        .await?;

    let mut pages = config.page_source();
    let mut driver = Driver::new(
        &session,
        &session,
        config.content_filter(),
        config.driver_settings(mode),
    );
    let report = driver.run(&mut ledger, &mut pages).await?;

    if report.order.is_empty() {
        tracing::warn!("Nothing was added to the basket");
        return Ok(report);
    }

    if mode == RunMode::DryRun {
        ConsoleNotifier.notify(&report.order.summary(None)).await?;
        return Ok(report);
    }

    let checkout_url = match session.checkout_url().await {
        Ok(url) => Some(url),
        Err(e) if e.is_authentication() => return Err(e),
        Err(e) => {
            tracing::warn!("Could not obtain checkout link: {}", e);
            None
        }
    };

    notifier.notify(&report.order.summary(checkout_url)).await?;
    Ok(report)
}

/// Console output, plus mail when a `[mail]` section is configured.
pub fn notifier_for(config: &TomlConfig) -> NotifierChain {
    with_mail(NotifierChain::new().with(ConsoleNotifier), config)
}

#[cfg(feature = "mail")]
fn with_mail(chain: NotifierChain, config: &TomlConfig) -> NotifierChain {
    match config.smtp_settings() {
        Some(settings) => chain.with(crate::adapters::mail::SmtpNotifier::new(settings)),
        None => chain,
    }
}

#[cfg(not(feature = "mail"))]
fn with_mail(chain: NotifierChain, config: &TomlConfig) -> NotifierChain {
    if config.mail.is_some() {
        tracing::warn!("[mail] is configured but this build has no mail support");
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"
[shop]
base_url = "https://www.shop.example/"
login_url = "https://www.shop.example/Mein-Konto/"
basket_url = "https://www.shop.example/Warenkorb/"
page_url = "https://www.shop.example/buecher/?page=$PAGE$"
max_page = 3

[account]
email = "me@example.com"
password = "secret"

[purchase]
target_spend = 5.0
max_item_price = 3.0
"#;

    #[test]
    fn test_notifier_without_mail_is_console_only() {
        let config = TomlConfig::from_toml_str(BASIC).unwrap();
        assert_eq!(notifier_for(&config).len(), 1);
    }

    #[cfg(feature = "mail")]
    #[test]
    fn test_notifier_with_mail_adds_smtp() {
        let toml = format!(
            "{}\n[mail]\nrecipient = \"me@example.com\"\nsender = \"robot@example.com\"\nsmtp_host = \"smtp.example.com\"\npassword = \"x\"\n",
            BASIC
        );
        let config = TomlConfig::from_toml_str(&toml).unwrap();
        assert_eq!(notifier_for(&config).len(), 2);
    }
}
