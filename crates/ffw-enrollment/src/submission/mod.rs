//! Submission pipeline: validate, render, deliver.

pub mod router;
pub mod service;

pub use router::enrollment_router;
pub use service::{EnrollmentService, PreviewDocument, SubmissionError, SubmissionReceipt};
