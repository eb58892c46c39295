//! Email service for operator notifications.
//!
//! Uses SMTP via lettre. Bodies are plain text; these are internal
//! operational mails, not marketing.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::db::products::LowStockProduct;

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

/// Email service for operational notifications.
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

    /// Send a batched low-stock alert to the operator.
    ///
    /// One email covers every product that crossed the threshold in this
    /// order, not one email per product.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to build or send.
    pub async fn send_low_stock_alert(
        &self,
        to: &str,
        products: &[LowStockProduct],
    ) -> Result<(), EmailError> {
        let subject = format!("[EaGCart] Low stock alert ({} products)", products.len());
        self.send_text_email(to, &subject, &low_stock_body(products))
            .await
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

/// Render the low-stock alert body.
fn low_stock_body(products: &[LowStockProduct]) -> String {
    let mut body = String::from(
        "The following products have fallen below the reorder threshold:\n\n",
    );
    for p in products {
        body.push_str(&format!(
            "- {} ({}): {} in stock, optimal {}\n",
            p.name,
            p.code.as_str(),
            p.current_stock,
            p.optimal_stock
        ));
    }
    body.push_str("\nPlease schedule an inbound shipment.\n");
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use eagcart_core::ProductCode;

    #[test]
    fn low_stock_body_lists_every_product() {
        let products = vec![
            LowStockProduct {
                code: ProductCode::from("P001"),
                name: "Keyboard".to_owned(),
                current_stock: 3,
                optimal_stock: 20,
            },
            LowStockProduct {
                code: ProductCode::from("P002"),
                name: "Mouse".to_owned(),
                current_stock: 5,
                optimal_stock: 30,
            },
        ];

        let body = low_stock_body(&products);
        assert!(body.contains("Keyboard (P001): 3 in stock, optimal 20"));
        assert!(body.contains("Mouse (P002): 5 in stock, optimal 30"));
    }
}
