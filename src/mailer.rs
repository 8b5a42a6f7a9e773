use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;
use crate::error::{AppError, Result};

/// SMTP mailer for the report digest: HTML body plus the chart PNG attached.
pub struct Mailer {
    config: SmtpConfig,
}

impl Mailer {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub fn recipient(&self) -> &str {
        &self.config.recipient
    }

    pub async fn send(
        &self,
        subject: &str,
        html_body: &str,
        attachment_name: &str,
        attachment: Vec<u8>,
    ) -> Result<()> {
        let message = build_message(
            &self.config,
            subject,
            html_body,
            attachment_name,
            attachment,
        )?;

        let transport: AsyncSmtpTransport<Tokio1Executor> =
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)?
                .port(self.config.port)
                .credentials(Credentials::new(
                    self.config.username.clone(),
                    self.config.password.clone(),
                ))
                .build();

        let response = transport.send(message).await?;
        tracing::info!(
            recipient = %self.config.recipient,
            code = %response.code(),
            "Email sent"
        );
        Ok(())
    }
}

fn build_message(
    config: &SmtpConfig,
    subject: &str,
    html_body: &str,
    attachment_name: &str,
    attachment: Vec<u8>,
) -> Result<Message> {
    let png = ContentType::parse("image/png")
        .map_err(|e| AppError::Email(format!("Invalid attachment content type: {e}")))?;

    let message = Message::builder()
        .from(config.sender().parse()?)
        .to(config.recipient.parse()?)
        .subject(subject)
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::html(html_body.to_string()))
                .singlepart(Attachment::new(attachment_name.to_string()).body(attachment, png)),
        )?;

    Ok(message)
}

/// Trim oracle chatter around the drafted email, keeping only the
/// `<!DOCTYPE html> ... </html>` document. Falls back to the trimmed input
/// when no complete document is found.
pub fn extract_html_document(text: &str) -> String {
    let start = find_ascii_ci(text, "<!doctype html>");
    let end = find_ascii_ci(text, "</html>");

    match (start, end) {
        (Some(start), Some(end)) if end > start => {
            text[start..end + "</html>".len()].to_string()
        }
        _ => text.trim().to_string(),
    }
}

/// Byte-offset search ignoring ASCII case. The draft may contain non-ASCII
/// text, so offsets from a lowercased copy would not be safe to slice with.
fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
