use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::service::{EnrollmentService, SubmissionError};
use crate::delivery::DocumentMailer;
use crate::document::ascii_file_name;
use crate::registration::RegistrationSubmission;

/// Router builder exposing the form endpoints the browser client posts to.
pub fn enrollment_router<M>(service: Arc<EnrollmentService<M>>) -> Router
where
    M: DocumentMailer + 'static,
{
    Router::new()
        .route("/api/form/submit", post(submit_handler::<M>))
        .route("/api/form/preview", post(preview_handler::<M>))
        .with_state(service)
}

pub(crate) async fn submit_handler<M>(
    State(service): State<Arc<EnrollmentService<M>>>,
    axum::Json(submission): axum::Json<RegistrationSubmission>,
) -> Response
where
    M: DocumentMailer + 'static,
{
    match service.submit(submission).await {
        Ok(receipt) => {
            let payload = json!({
                "success": true,
                "fileName": receipt.file_name,
                "recipientEmail": receipt.recipient,
                "sizeBytes": receipt.size_bytes,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn preview_handler<M>(
    State(service): State<Arc<EnrollmentService<M>>>,
    axum::Json(submission): axum::Json<RegistrationSubmission>,
) -> Response
where
    M: DocumentMailer + 'static,
{
    match service.preview(submission) {
        Ok(preview) => {
            let disposition = format!(
                "inline; filename=\"{}\"",
                ascii_file_name(&preview.file_name)
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime::APPLICATION_PDF.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                preview.bytes,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

fn error_response(err: SubmissionError) -> Response {
    match err {
        SubmissionError::Validation(error) => {
            let payload = json!({
                "success": false,
                "error": "Bitte überprüfen Sie Ihre Eingaben",
                "fields": error.violations,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        SubmissionError::Render(error) => {
            let payload = json!({
                "success": false,
                "stage": "render",
                "error": "Failed to process form submission",
                "message": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
        SubmissionError::Delivery(error) => {
            let payload = json!({
                "success": false,
                "stage": "delivery",
                "error": "Failed to send email",
                "message": error.to_string(),
            });
            (StatusCode::BAD_GATEWAY, axum::Json(payload)).into_response()
        }
    }
}
