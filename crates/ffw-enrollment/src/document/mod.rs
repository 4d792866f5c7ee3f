//! Single-page A4 rendering of a registration record.
//!
//! [`RegistrationRenderer::compose`] lays the form out as a [`PageLayout`];
//! [`RegistrationRenderer::render`] serializes that layout as PDF bytes.

pub mod assets;
pub mod layout;
pub mod metrics;
mod pdf;
pub mod raster;
mod renderer;

pub use assets::{LogoAsset, LogoResolver};
pub use layout::{ChoiceOption, ChoiceSection, Element, ImageRole, PageLayout, TextRun};
pub use pdf::DocumentInfo;
pub use raster::{ImageDecodeError, RasterImage};
pub use renderer::{ascii_file_name, document_file_name, RegistrationRenderer, RenderedDocument};

/// Failure to produce the output stream at all.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to compress PDF stream: {0}")]
    Compression(#[source] std::io::Error),
}
