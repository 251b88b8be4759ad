//! Transactional mail over the provider's HTTP API.
//!
//! Delivery is best-effort: login flows must not fail because the mail
//! provider is down, so handlers spawn sends in the background and only log
//! failures.

use anyhow::{Context, Result, bail};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use crate::config::MailConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: EmailAddress,
    to: Vec<EmailAddress>,
    subject: String,
    html_content: String,
}

#[derive(Clone)]
pub struct Mailer {
    client: Client,
    config: MailConfig,
}

impl Mailer {
    pub fn new(config: MailConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build mail HTTP client")?;

        Ok(Self { client, config })
    }

    /// True when sends will actually go out; otherwise they are logged and
    /// dropped (local development, tests).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.config.enabled && self.config.api_key.is_some()
    }

    pub async fn send_otp_email(&self, to: &str, otp: &str) -> Result<()> {
        let html = format!(
            "<p>Your login code is <strong>{otp}</strong>. \
             It expires in a few minutes. If you did not request this code, \
             you can ignore this email.</p>"
        );
        self.send(to, "Your login code", html).await
    }

    pub async fn send_activation_code_email(
        &self,
        to: &str,
        organization_name: &str,
        activation_code: &str,
    ) -> Result<()> {
        let html = format!(
            "<p>You have been invited to join <strong>{organization_name}</strong>.</p>\
             <p>Your activation code is <strong>{activation_code}</strong>.</p>"
        );
        self.send(to, "Your organization invitation", html).await
    }

    async fn send(&self, to: &str, subject: &str, html: String) -> Result<()> {
        if !self.is_enabled() {
            info!(subject, "mail delivery disabled, dropping message");
            return Ok(());
        }

        let Some(api_key) = self.config.api_key.as_deref() else {
            bail!("Mail API key is not configured");
        };

        let body = SendEmailBody {
            sender: EmailAddress {
                email: self.config.from_address.clone(),
                name: Some(self.config.from_name.clone()),
            },
            to: vec![EmailAddress {
                email: to.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            html_content: html,
        };

        let response = self
            .client
            .post(&self.config.api_url)
            .header("api-key", api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await
            .context("Mail provider request failed")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            bail!("Mail provider rejected the message (status={status}): {detail}");
        }

        Ok(())
    }
}
