use crate::domain::ports::Notifier;
use crate::domain::summary::OrderSummary;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Prints the summary; used for dry runs and when no `[mail]` section is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn notify(&self, summary: &OrderSummary) -> Result<()> {
        println!("{}", summary.render());
        Ok(())
    }
}

/// Delivers the summary to each notifier in turn, stopping at the first failure.
#[derive(Default)]
pub struct NotifierChain {
    notifiers: Vec<Box<dyn Notifier>>,
}

impl NotifierChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifiers.push(Box::new(notifier));
        self
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

#[async_trait]
impl Notifier for NotifierChain {
    async fn notify(&self, summary: &OrderSummary) -> Result<()> {
        for notifier in &self.notifiers {
            notifier.notify(summary).await?;
        }
        Ok(())
    }
}

#[cfg(feature = "mail")]
pub use smtp::{SmtpNotifier, SmtpSettings};

#[cfg(feature = "mail")]
mod smtp {
    use super::*;
    use crate::utils::error::BasketError;
    use lettre::message::header::ContentType;
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

    #[derive(Debug, Clone)]
    pub struct SmtpSettings {
        pub recipient: String,
        pub sender: String,
        pub smtp_host: String,
        pub smtp_port: u16,
        pub password: String,
    }

    /// Mails the summary through an authenticated STARTTLS relay.
    pub struct SmtpNotifier {
        settings: SmtpSettings,
    }

    impl SmtpNotifier {
        pub fn new(settings: SmtpSettings) -> Self {
            Self { settings }
        }

        pub fn build_message(&self, summary: &OrderSummary) -> Result<Message> {
            let from = self.settings.sender.parse().map_err(|e| mail_error("sender", e))?;
            let to = self.settings.recipient.parse().map_err(|e| mail_error("recipient", e))?;

            Message::builder()
                .from(from)
                .to(to)
                .subject(summary.subject())
                .header(ContentType::TEXT_PLAIN)
                .body(summary.render())
                .map_err(|e| mail_error("message", e))
        }
    }

    fn mail_error(what: &str, e: impl std::fmt::Display) -> BasketError {
        BasketError::Mail {
            message: format!("{}: {}", what, e),
        }
    }

    #[async_trait]
    impl Notifier for SmtpNotifier {
        async fn notify(&self, summary: &OrderSummary) -> Result<()> {
            let message = self.build_message(summary)?;

            let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.settings.smtp_host)
                .map_err(|e| mail_error("relay", e))?
                .port(self.settings.smtp_port)
                .credentials(Credentials::new(
                    self.settings.sender.clone(),
                    self.settings.password.clone(),
                ))
                .build();

            transport.send(message).await.map_err(|e| mail_error("send", e))?;
            tracing::info!("📧 Order summary sent to {}", self.settings.recipient);
            Ok(())
        }
    }

}
