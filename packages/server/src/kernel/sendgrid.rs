use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{info, warn};

use super::{BaseEmailService, EmailMessage};

const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// SendGrid v3 mail client
pub struct SendGridClient {
    client: Client,
    api_key: String,
    from_email: String,
    from_name: String,
}

#[derive(Debug, Serialize)]
struct SendGridAddress<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct SendGridPersonalization<'a> {
    to: Vec<SendGridAddress<'a>>,
}

#[derive(Debug, Serialize)]
struct SendGridContent<'a> {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: &'a str,
}

#[derive(Debug, Serialize)]
struct SendGridMail<'a> {
    personalizations: Vec<SendGridPersonalization<'a>>,
    from: SendGridAddress<'a>,
    subject: &'a str,
    content: Vec<SendGridContent<'a>>,
}

impl SendGridClient {
    pub fn new(api_key: String, from_email: String, from_name: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from_email,
            from_name,
        }
    }

    fn payload<'a>(&'a self, message: &'a EmailMessage) -> SendGridMail<'a> {
        SendGridMail {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridAddress {
                    email: &message.to_email,
                    name: &message.to_name,
                }],
            }],
            from: SendGridAddress {
                email: &self.from_email,
                name: &self.from_name,
            },
            subject: &message.subject,
            content: vec![
                SendGridContent {
                    content_type: "text/plain",
                    value: &message.plain_content,
                },
                SendGridContent {
                    content_type: "text/html",
                    value: &message.html_content,
                },
            ],
        }
    }
}

#[async_trait]
impl BaseEmailService for SendGridClient {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(to = %message.to_email, subject = %message.subject, "Sending email");

        let response = self
            .client
            .post(SENDGRID_SEND_URL)
            .bearer_auth(&self.api_key)
            .json(&self.payload(message))
            .send()
            .await
            .context("SendGrid request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("SendGrid returned {}: {}", status, body);
        }

        Ok(())
    }
}

/// Used when no SendGrid key is configured; emails are logged and dropped
pub struct NoopEmailService;

#[async_trait]
impl BaseEmailService for NoopEmailService {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        warn!(
            to = %message.to_email,
            subject = %message.subject,
            "Email delivery disabled, dropping message"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let client = SendGridClient::new(
            "SG.test".to_string(),
            "notifications@groops.fun".to_string(),
            "Groops".to_string(),
        );
        let message = EmailMessage {
            to_email: "ann@example.com".to_string(),
            to_name: "ann".to_string(),
            subject: "Hello".to_string(),
            plain_content: "plain".to_string(),
            html_content: "<p>html</p>".to_string(),
        };

        let json = serde_json::to_value(client.payload(&message)).unwrap();
        assert_eq!(json["personalizations"][0]["to"][0]["email"], "ann@example.com");
        assert_eq!(json["from"]["name"], "Groops");
        assert_eq!(json["content"][0]["type"], "text/plain");
        assert_eq!(json["content"][1]["value"], "<p>html</p>");
    }
}
