use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, error};

use crate::config::MailConfig;

/// Outbound notification capability. The auth service only ever needs to
/// deliver a password-reset link, so that is the whole contract.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(
        &self,
        recipient_name: &str,
        recipient_email: &str,
        reset_link: &str,
    ) -> anyhow::Result<()>;
}

pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl SmtpMailer {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)?;
        if !config.smtp_username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            ));
        }
        let from = config
            .from_address
            .parse::<Mailbox>()
            .map_err(|e| anyhow::anyhow!("invalid MAIL_FROM address: {e}"))?;
        Ok(Self {
            transport: builder.build(),
            from,
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(
        &self,
        recipient_name: &str,
        recipient_email: &str,
        reset_link: &str,
    ) -> anyhow::Result<()> {
        let to = format!("{recipient_name} <{recipient_email}>")
            .parse::<Mailbox>()
            .map_err(|e| anyhow::anyhow!("invalid recipient address: {e}"))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject("Reset your password")
            .header(ContentType::TEXT_HTML)
            .body(format!(
                "<h2>Click the link to reset your password</h2>\n\
                 <a href=\"{reset_link}\">Reset password</a>"
            ))?;

        self.transport.send(message).await.map_err(|e| {
            error!(error = %e, "smtp send failed");
            anyhow::anyhow!(e)
        })?;
        debug!(email = %recipient_email, "password reset email sent");
        Ok(())
    }
}
