use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::delivery::{DeliveryError, DeliveryRequest, DocumentMailer};
use crate::document::{document_file_name, RegistrationRenderer, RenderError};
use crate::registration::{
    RegistrationGuard, RegistrationRecord, RegistrationSubmission, ValidationError,
};

/// Service composing the registration guard, the renderer and the mail transport.
pub struct EnrollmentService<M> {
    guard: Arc<RegistrationGuard>,
    renderer: Arc<RegistrationRenderer>,
    mailer: Arc<M>,
    timeout: Duration,
}

/// Outcome of a delivered submission, as reported back to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub file_name: String,
    pub recipient: String,
    pub size_bytes: usize,
}

/// A rendered form returned to the caller instead of being mailed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl<M> EnrollmentService<M>
where
    M: DocumentMailer + 'static,
{
    pub fn new(renderer: RegistrationRenderer, mailer: Arc<M>, timeout: Duration) -> Self {
        Self {
            guard: Arc::new(RegistrationGuard::new()),
            renderer: Arc::new(renderer),
            mailer,
            timeout,
        }
    }

    /// Validate, render and mail one submission.
    pub async fn submit(
        &self,
        submission: RegistrationSubmission,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        let record = self.validate(submission)?;
        let document = self.render(&record)?;
        let size_bytes = document.bytes.len();
        let file_name = document.file_name.clone();

        let request = DeliveryRequest {
            file_name: document.file_name,
            document: document.bytes,
            summary_lines: summary_lines(&record),
        };

        let receipt = match tokio::time::timeout(self.timeout, self.mailer.deliver(request)).await
        {
            Ok(Ok(receipt)) => receipt,
            Ok(Err(err)) => {
                error!(error = %err, file_name = %file_name, "error sending email");
                return Err(err.into());
            }
            Err(_) => {
                error!(timeout = ?self.timeout, file_name = %file_name, "email delivery timed out");
                return Err(DeliveryError::TimedOut(self.timeout).into());
            }
        };

        Ok(SubmissionReceipt {
            file_name,
            recipient: receipt.recipient,
            size_bytes,
        })
    }

    /// Validate and render without sending anything.
    pub fn preview(
        &self,
        submission: RegistrationSubmission,
    ) -> Result<PreviewDocument, SubmissionError> {
        let record = self.validate(submission)?;
        self.render(&record)
    }

    fn validate(
        &self,
        submission: RegistrationSubmission,
    ) -> Result<RegistrationRecord, SubmissionError> {
        info!(
            first_name = submission.first_name.as_deref().unwrap_or_default(),
            last_name = submission.last_name.as_deref().unwrap_or_default(),
            "form submission received"
        );
        self.guard.record_from_submission(submission).map_err(|err| {
            warn!(violations = err.violations.len(), "form submission rejected");
            SubmissionError::from(err)
        })
    }

    fn render(&self, record: &RegistrationRecord) -> Result<PreviewDocument, SubmissionError> {
        let rendered = self.renderer.render(record).map_err(|err| {
            error!(error = %err, "error generating PDF");
            SubmissionError::from(err)
        })?;
        Ok(PreviewDocument {
            file_name: document_file_name(record, Local::now().date_naive()),
            bytes: rendered.bytes,
        })
    }
}

/// Lines appended to the delivery message so the board sees the key facts without opening
/// the attachment.
fn summary_lines(record: &RegistrationRecord) -> Vec<String> {
    vec![
        format!("Name: {}", record.person.full_name()),
        format!("Mitgliedschaft: {}", record.membership.category()),
        format!("Abteilung: {}", record.membership.department()),
        format!("E-Mail: {}", record.contact.email),
    ]
}

/// Error raised by the enrollment service. Each variant is one failure stage.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
