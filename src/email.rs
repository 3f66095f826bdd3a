//! Email delivery for notifications.
//!
//! Delivery is best-effort: the notification row is the source of truth and
//! is committed before any email leaves the process. Callers spawn sends in
//! the background and failures only produce a log line.

use anyhow::anyhow;
use lettre::{
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, header::ContentType},
    transport::smtp::authentication::Credentials,
};
use std::path::Path;

use crate::config::{EmailConfig, EmailTransportConfig};
use crate::errors::Error;

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

impl EmailService {
    pub fn new(config: &EmailConfig) -> Result<Self, Error> {
        let transport = match &config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal(anyhow!("create SMTP transport: {e}")))?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir)
                        .map_err(|e| Error::Internal(anyhow!("create emails directory: {e}")))?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        })
    }

    /// Send a notification as plain text to a single recipient.
    pub async fn send_notification(
        &self,
        to_email: &str,
        to_name: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), Error> {
        let from = format!("{} <{}>", self.from_name, self.from_email)
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal(anyhow!("parse from email: {e}")))?;

        let to = format!("{to_name} <{to_email}>")
            .parse::<Mailbox>()
            .map_err(|e| Error::Internal(anyhow!("parse to email: {e}")))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| Error::Internal(anyhow!("build email message: {e}")))?;

        match &self.transport {
            EmailTransport::Smtp(transport) => {
                transport
                    .send(message)
                    .await
                    .map_err(|e| Error::Internal(anyhow!("send email via SMTP: {e}")))?;
            }
            EmailTransport::File(transport) => {
                transport
                    .send(message)
                    .await
                    .map_err(|e| Error::Internal(anyhow!("write email to file: {e}")))?;
            }
        }

        tracing::debug!(to = %to_email, subject = %subject, "notification email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_transport_writes_messages() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmailConfig {
            transport: EmailTransportConfig::File {
                path: dir.path().to_string_lossy().to_string(),
            },
            from_email: "alerts@example.com".to_string(),
            from_name: "Alerts".to_string(),
        };

        let service = EmailService::new(&config).unwrap();
        service
            .send_notification("lena@example.com", "lena", "Low stock: gloves", "Only 2 left")
            .await
            .unwrap();

        let written = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(written, 1);
    }
}
