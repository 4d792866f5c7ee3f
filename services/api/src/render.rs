use crate::infra::{renderer_for, sample_submission};
use chrono::Local;
use clap::Args;
use ffw_enrollment::config::AppConfig;
use ffw_enrollment::document::{document_file_name, RegistrationRenderer};
use ffw_enrollment::error::AppError;
use ffw_enrollment::registration::{RegistrationGuard, RegistrationSubmission};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct RenderArgs {
    /// Submission JSON as posted by the browser form
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Where to write the rendered PDF
    #[arg(long)]
    pub(crate) output: PathBuf,
    /// Logo file to use instead of the configured lookup
    #[arg(long)]
    pub(crate) logo: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct SampleArgs {
    /// Where to write the rendered PDF (defaults to the generated file name)
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
    /// Logo file to use instead of the configured lookup
    #[arg(long)]
    pub(crate) logo: Option<PathBuf>,
}

pub(crate) fn run_render(args: RenderArgs) -> Result<(), AppError> {
    let RenderArgs {
        input,
        output,
        logo,
    } = args;

    let raw = std::fs::read(&input)?;
    let submission: RegistrationSubmission = serde_json::from_slice(&raw)?;
    let config = AppConfig::load()?;
    let renderer = renderer_for(&config.assets, logo);
    render_to_path(&renderer, submission, Some(output.as_path())).map(|_| ())
}

pub(crate) fn run_sample(args: SampleArgs) -> Result<(), AppError> {
    let SampleArgs { output, logo } = args;
    let config = AppConfig::load()?;
    let renderer = renderer_for(&config.assets, logo);
    render_to_path(&renderer, sample_submission(), output.as_deref()).map(|_| ())
}

/// Validates and renders one submission, printing violations when it is rejected.
/// Returns the path written.
pub(crate) fn render_to_path(
    renderer: &RegistrationRenderer,
    submission: RegistrationSubmission,
    output: Option<&Path>,
) -> Result<PathBuf, AppError> {
    let record = match RegistrationGuard::new().record_from_submission(submission) {
        Ok(record) => record,
        Err(err) => {
            println!("Submission rejected:");
            for violation in &err.violations {
                println!("- {}: {}", violation.field, violation.message);
            }
            return Err(err.into());
        }
    };

    let document = renderer.render(&record)?;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(document_file_name(&record, Local::now().date_naive())),
    };
    std::fs::write(&path, &document.bytes)?;

    println!(
        "{} ({}, {}) -> {} [{} bytes]",
        record.person.full_name(),
        record.membership.category(),
        record.membership.department(),
        path.display(),
        document.size_bytes()
    );
    Ok(path)
}
