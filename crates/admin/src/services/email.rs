//! Email service for customer-facing claim notifications.
//!
//! Uses SMTP via lettre with plain text bodies.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email service for claim notifications.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay is invalid.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Tell the customer their return/exchange request was rejected.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to build or send.
    pub async fn send_claim_rejected(
        &self,
        to: &str,
        order_code: &str,
        product_name: &str,
        reason: &str,
    ) -> Result<(), EmailError> {
        let subject = format!("[EaGCart] Your request for order {order_code} was declined");
        let body = claim_rejected_body(order_code, product_name, reason);
        self.send_text_email(to, &subject, &body).await
    }

    /// Send a plain text email.
    async fn send_text_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

fn claim_rejected_body(order_code: &str, product_name: &str, reason: &str) -> String {
    format!(
        "Hello,\n\n\
         Your return/exchange request for \"{product_name}\" in order \
         {order_code} has been reviewed and declined. The item remains in \
         delivered status.\n\n\
         Your stated reason: {reason}\n\n\
         If you believe this is a mistake, please contact customer support \
         with your order code.\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_body_names_order_product_and_reason() {
        let body = claim_rejected_body("ORD17000000000042", "Keyboard", "DEFECT - dead keys");
        assert!(body.contains("ORD17000000000042"));
        assert!(body.contains("Keyboard"));
        assert!(body.contains("DEFECT - dead keys"));
    }
}
