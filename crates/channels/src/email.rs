use {
    async_trait::async_trait,
    lettre::{
        Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
        message::{Mailbox, header::ContentType},
        transport::smtp::authentication::Credentials,
    },
    secrecy::ExposeSecret,
    tracing::debug,
    voicewatch_config::EmailConfig,
};

use crate::{DeliveryError, Result, sink::EmailSink};

const SUBMISSION_PORT: u16 = 587;

/// Sends HTML alerts through an authenticated SMTP relay.
pub struct SmtpEmailSink {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl SmtpEmailSink {
    /// Builds the transport without connecting; the first send opens the
    /// TLS session.
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let from_address: Address = config
            .username
            .parse()
            .map_err(|e| DeliveryError::external("parse email.username", e))?;
        let to: Mailbox = config
            .to
            .parse()
            .map_err(|e| DeliveryError::external("parse email.to", e))?;

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().clone(),
        );
        // Submission port speaks STARTTLS, everything else implicit TLS.
        let builder = if config.smtp_port == Some(SUBMISSION_PORT) {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        };
        let mut builder = builder
            .map_err(|e| DeliveryError::external("configure SMTP relay", e))?
            .credentials(credentials);
        if let Some(port) = config.smtp_port {
            builder = builder.port(port);
        }

        Ok(Self {
            transport: builder.build(),
            from: Mailbox::new(Some(config.from_name.clone()), from_address),
            to,
        })
    }

    fn build_message(&self, subject: &str, html: &str) -> Result<Message> {
        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html.to_string())
            .map_err(|e| DeliveryError::external("build email", e))
    }
}

#[async_trait]
impl EmailSink for SmtpEmailSink {
    async fn send_email(&self, subject: &str, html: &str) -> Result<()> {
        let message = self.build_message(subject, html)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| DeliveryError::external("send email", e))?;
        debug!(to = %self.to, subject, "email sent");
        Ok(())
    }
}
