use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use ffw_enrollment::delivery::DocumentMailer;
use ffw_enrollment::submission::{enrollment_router, EnrollmentService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_enrollment_routes<M>(service: Arc<EnrollmentService<M>>) -> axum::Router
where
    M: DocumentMailer + 'static,
{
    enrollment_router(service)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::sample_submission;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use ffw_enrollment::delivery::{DeliveryError, DeliveryReceipt, DeliveryRequest};
    use ffw_enrollment::document::{LogoResolver, RegistrationRenderer};
    use ffw_enrollment::organization::OrganizationProfile;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tower::ServiceExt;

    struct AcceptingMailer;

    impl DocumentMailer for AcceptingMailer {
        fn recipient(&self) -> &str {
            "vorstand@ff-apfeltrang.de"
        }

        async fn deliver(
            &self,
            _request: DeliveryRequest,
        ) -> Result<DeliveryReceipt, DeliveryError> {
            Ok(DeliveryReceipt {
                recipient: self.recipient().to_string(),
            })
        }
    }

    fn app(ready: bool) -> axum::Router {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let service = Arc::new(EnrollmentService::new(
            RegistrationRenderer::new(OrganizationProfile::apfeltrang(), LogoResolver::disabled()),
            Arc::new(AcceptingMailer),
            Duration::from_secs(5),
        ));
        with_enrollment_routes(service).layer(Extension(state))
    }

    async fn read_json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let Json(body) = healthcheck().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn readiness_is_unavailable_until_bound() {
        let response = app(false)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json_body(response).await["status"], "initializing");

        let response = app(true)
            .oneshot(Request::get("/ready").body(Body::empty()).expect("request"))
            .await
            .expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn form_routes_are_merged() {
        let body = serde_json::to_string(&sample_submission()).expect("serializes");
        let request = Request::post("/api/form/submit")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .expect("request");
        let response = app(true).oneshot(request).await.expect("router responds");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(read_json_body(response).await["success"], true);
    }
}
