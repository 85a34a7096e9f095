use serde::{Deserialize, Serialize};

use super::{mask_email, ServiceError};

const RESEND_API_URL: &str = "https://api.resend.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Send-email port
pub trait Mailer: Send + Sync {
    fn send(&self, email: &OutgoingEmail) -> Result<(), ServiceError>;
}

/// Access-link message sent after a purchase or on request
pub fn report_link_email(to: &str, link: &str, expires_in_hours: i64) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "Your Geni DNA report is ready".to_string(),
        html: format!(
            "<p>Your DNA report is ready.</p>\
             <p><a href=\"{link}\">Open your report</a></p>\
             <p>This link works for {expires_in_hours} hours. \
             You can request a new one at any time.</p>"
        ),
        text: format!(
            "Your DNA report is ready.\n\nOpen it here: {link}\n\n\
             This link works for {expires_in_hours} hours."
        ),
    }
}

/// Resend HTTP client
pub struct ResendMailer {
    base_url: String,
    api_key: String,
    from: String,
    client: reqwest::blocking::Client,
}

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ResendResponse {
    id: String,
}

impl ResendMailer {
    pub fn new(api_key: &str, from: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        Self::with_base_url(RESEND_API_URL, api_key, from, timeout_secs)
    }

    pub fn with_base_url(
        base_url: &str,
        api_key: &str,
        from: &str,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            from: from.to_string(),
            client,
        })
    }
}

impl Mailer for ResendMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), ServiceError> {
        let url = format!("{}/emails", self.base_url);
        let body = ResendRequest {
            from: &self.from,
            to: [&email.to],
            subject: &email.subject,
            html: &email.html,
            text: &email.text,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| ServiceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ServiceError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let sent: ResendResponse = response
            .json()
            .map_err(|e| ServiceError::Http(e.to_string()))?;
        tracing::info!(message_id = %sent.id, to = %mask_email(&email.to), "Email sent");
        Ok(())
    }
}

/// Logs instead of sending. Used when no Resend key is configured.
pub struct LogMailer;

impl Mailer for LogMailer {
    fn send(&self, email: &OutgoingEmail) -> Result<(), ServiceError> {
        tracing::info!(
            to = %mask_email(&email.to),
            subject = %email.subject,
            "Email delivery disabled, message not sent"
        );
        tracing::debug!(body = %email.text, "Undelivered email body");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_email_contains_link() {
        let email = report_link_email("ada@example.com", "https://geni.test/r/1?token=t", 72);
        assert_eq!(email.to, "ada@example.com");
        assert!(email.html.contains("https://geni.test/r/1?token=t"));
        assert!(email.text.contains("72 hours"));
    }

    #[test]
    fn log_mailer_always_succeeds() {
        let email = report_link_email("ada@example.com", "https://geni.test", 1);
        assert!(LogMailer.send(&email).is_ok());
    }

    #[test]
    fn resend_connection_failure_is_http_error() {
        // Port 9 (discard) on localhost is not listening
        let mailer =
            ResendMailer::with_base_url("http://127.0.0.1:9", "re_test", "Geni <hi@geni.test>", 2)
                .unwrap();
        let email = report_link_email("ada@example.com", "https://geni.test", 1);
        assert!(matches!(mailer.send(&email), Err(ServiceError::Http(_))));
    }
}
