use ffw_enrollment::config::AssetConfig;
use ffw_enrollment::document::{LogoResolver, RegistrationRenderer};
use ffw_enrollment::organization::OrganizationProfile;
use ffw_enrollment::registration::{ChoiceAnswer, RegistrationSubmission};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Renderer for the association, with the logo looked up per the asset settings.
/// An explicit `logo` replaces the configured one.
pub(crate) fn renderer_for(assets: &AssetConfig, logo: Option<PathBuf>) -> RegistrationRenderer {
    let mut assets = assets.clone();
    if logo.is_some() {
        assets.logo_path = logo;
    }
    RegistrationRenderer::new(
        OrganizationProfile::apfeltrang(),
        LogoResolver::from_config(&assets),
    )
}

/// The Anna Muster registration used for demos and smoke tests.
pub(crate) fn sample_submission() -> RegistrationSubmission {
    RegistrationSubmission {
        first_name: Some("Anna".to_string()),
        last_name: Some("Muster".to_string()),
        birth_date: Some("1990-04-12".to_string()),
        street: Some("Hauptstraße 3".to_string()),
        postal_code: Some("87674".to_string()),
        city: Some("Ruderatshofen".to_string()),
        phone: Some("08343 1234".to_string()),
        mobile: None,
        email: Some("anna@example.com".to_string()),
        whatsapp_group: Some(ChoiceAnswer::Flag(false)),
        previous_fire_department: None,
        entry_date: None,
        active_member: Some(ChoiceAnswer::Flag(true)),
        account_holder: None,
        bic: None,
        iban: None,
        place: Some("Apfeltrang".to_string()),
        signature_date: Some("2025-03-01".to_string()),
        signature: Some("Anna Muster".to_string()),
        parent_signature: None,
        department: None,
        membership_type: None,
    }
}
