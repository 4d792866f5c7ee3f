//! Outbound delivery of a rendered form to the association's mailbox.

mod smtp;

use std::future::Future;

pub use smtp::SmtpMailer;

pub const MESSAGE_SUBJECT: &str = "Neue Beitrittserklärung zur Freiwilligen Feuerwehr";
pub const MESSAGE_INTRO: &str =
    "Im Anhang finden Sie eine neue Beitrittserklärung zur Freiwilligen Feuerwehr.";

/// A rendered document ready to be sent. The destination is fixed by the mailer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryRequest {
    pub file_name: String,
    pub document: Vec<u8>,
    /// Short membership summary appended to the message body.
    pub summary_lines: Vec<String>,
}

impl DeliveryRequest {
    /// Plain-text message body: the fixed introduction, then the summary.
    pub fn body(&self) -> String {
        let mut body = MESSAGE_INTRO.to_string();
        if !self.summary_lines.is_empty() {
            body.push_str("\n\n");
            body.push_str(&self.summary_lines.join("\n"));
        }
        body.push('\n');
        body
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    pub recipient: String,
}

/// Transport seam so the submission pipeline can run against a fake in tests.
pub trait DocumentMailer: Send + Sync {
    /// Mailbox every document is sent to.
    fn recipient(&self) -> &str;

    fn deliver(
        &self,
        request: DeliveryRequest,
    ) -> impl Future<Output = Result<DeliveryReceipt, DeliveryError>> + Send;
}

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Email configuration is incomplete")]
    NotConfigured,
    #[error("invalid mail address '{value}': {source}")]
    Address {
        value: String,
        #[source]
        source: lettre::address::AddressError,
    },
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
    #[error("invalid attachment content type: {0}")]
    ContentType(#[from] lettre::message::header::ContentTypeErr),
    #[error("SMTP error sending mail: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
    #[error("mail delivery did not finish within {0:?}")]
    TimedOut(std::time::Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_starts_with_fixed_introduction() {
        let request = DeliveryRequest {
            file_name: "form.pdf".to_string(),
            document: Vec::new(),
            summary_lines: vec![
                "Name: Anna Muster".to_string(),
                "Mitgliedschaft: Aktives Mitglied".to_string(),
            ],
        };
        let body = request.body();
        assert!(body.starts_with(MESSAGE_INTRO));
        assert!(body.contains("\n\nName: Anna Muster\nMitgliedschaft: Aktives Mitglied"));
    }

    #[test]
    fn not_configured_message_matches_client_expectation() {
        assert_eq!(
            DeliveryError::NotConfigured.to_string(),
            "Email configuration is incomplete"
        );
    }
}
