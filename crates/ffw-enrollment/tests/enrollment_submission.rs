//! End-to-end submission pipeline: validation, rendering and delivery behind the HTTP router.

mod common {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use ffw_enrollment::delivery::{
        DeliveryError, DeliveryReceipt, DeliveryRequest, DocumentMailer,
    };
    use ffw_enrollment::document::{LogoResolver, RegistrationRenderer};
    use ffw_enrollment::organization::OrganizationProfile;
    use ffw_enrollment::submission::EnrollmentService;
    use serde_json::{json, Value};

    pub(super) const MAILBOX: &str = "vorstand@ff-apfeltrang.de";

    #[derive(Default, Clone)]
    pub(super) struct RecordingMailer {
        sent: Arc<Mutex<Vec<DeliveryRequest>>>,
    }

    impl RecordingMailer {
        pub(super) fn sent(&self) -> Vec<DeliveryRequest> {
            self.sent.lock().expect("mailer mutex poisoned").clone()
        }
    }

    impl DocumentMailer for RecordingMailer {
        fn recipient(&self) -> &str {
            MAILBOX
        }

        async fn deliver(
            &self,
            request: DeliveryRequest,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            self.sent
                .lock()
                .expect("mailer mutex poisoned")
                .push(request);
            Ok(DeliveryReceipt {
                recipient: MAILBOX.to_string(),
            })
        }
    }

    pub(super) struct SlowMailer;

    impl DocumentMailer for SlowMailer {
        fn recipient(&self) -> &str {
            MAILBOX
        }

        async fn deliver(
            &self,
            _request: DeliveryRequest,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(DeliveryReceipt {
                recipient: MAILBOX.to_string(),
            })
        }
    }

    pub(super) fn service<M: DocumentMailer + 'static>(
        mailer: Arc<M>,
        timeout: Duration,
    ) -> Arc<EnrollmentService<M>> {
        Arc::new(EnrollmentService::new(
            RegistrationRenderer::new(OrganizationProfile::apfeltrang(), LogoResolver::disabled()),
            mailer,
            timeout,
        ))
    }

    /// Payload in the shape the browser form posts, including the fields the server ignores.
    pub(super) fn form_payload() -> Value {
        json!({
            "firstName": "Anna",
            "lastName": "Muster",
            "birthDate": "1990-04-11T22:00:00.000Z",
            "street": "Hauptstraße 3",
            "postalCode": "87674",
            "city": "Ruderatshofen",
            "phone": "08343 1234",
            "mobile": "",
            "email": "anna@example.com",
            "whatsappGroup": false,
            "previousFireDepartment": "",
            "entryDate": null,
            "activeMember": true,
            "department": "Aktive Abteilung",
            "membershipType": "Aktives Mitglied",
            "accountHolder": "",
            "bic": "",
            "iban": "",
            "place": "Apfeltrang",
            "signatureDate": "2025-03-01",
            "signature": "Anna Muster",
            "parentSignature": ""
        })
    }
}

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use common::{form_payload, service, RecordingMailer, SlowMailer, MAILBOX};
use ffw_enrollment::submission::enrollment_router;
use serde_json::{json, Value};
use tower::ServiceExt;

fn post(uri: &str, payload: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request builds")
}

async fn read_json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

#[tokio::test]
async fn accepted_submission_is_mailed_once_to_the_fixed_mailbox() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = enrollment_router(service(mailer.clone(), Duration::from_secs(5)));

    let response = app
        .oneshot(post("/api/form/submit", &form_payload()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);

    let body = read_json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["recipientEmail"], MAILBOX);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(body["fileName"], sent[0].file_name.as_str());
    assert_eq!(body["sizeBytes"], sent[0].document.len());
    assert!(sent[0].document.starts_with(b"%PDF-"));
    assert!(sent[0]
        .summary_lines
        .iter()
        .any(|line| line == "Abteilung: Aktive Abteilung"));
}

#[tokio::test]
async fn every_violation_is_reported_with_its_field() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = enrollment_router(service(mailer.clone(), Duration::from_secs(5)));

    let mut payload = form_payload();
    payload["postalCode"] = json!("876745");
    payload["email"] = json!("anna@");
    payload["signature"] = json!("   ");

    let response = app
        .oneshot(post("/api/form/submit", &payload))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = read_json_body(response).await;
    let fields: Vec<(String, String)> = body["fields"]
        .as_array()
        .expect("fields array")
        .iter()
        .map(|entry| {
            (
                entry["field"].as_str().unwrap_or_default().to_string(),
                entry["message"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    assert_eq!(
        fields,
        vec![
            (
                "postalCode".to_string(),
                "Postleitzahl muss 5-stellig sein".to_string()
            ),
            ("email".to_string(), "Ungültige E-Mail-Adresse".to_string()),
            (
                "signature".to_string(),
                "Unterschrift ist erforderlich".to_string()
            ),
        ]
    );
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn slow_delivery_surfaces_as_delivery_stage_failure() {
    let app = enrollment_router(service(Arc::new(SlowMailer), Duration::from_millis(50)));

    let response = app
        .oneshot(post("/api/form/submit", &form_payload()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = read_json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["stage"], "delivery");
    assert_eq!(body["error"], "Failed to send email");
}

#[tokio::test]
async fn preview_does_not_send_mail() {
    let mailer = Arc::new(RecordingMailer::default());
    let app = enrollment_router(service(mailer.clone(), Duration::from_secs(5)));

    let response = app
        .oneshot(post("/api/form/preview", &form_payload()))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert!(mailer.sent().is_empty());
}
