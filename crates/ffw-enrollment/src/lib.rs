pub mod config;
pub mod delivery;
pub mod document;
pub mod error;
pub mod organization;
pub mod registration;
pub mod submission;
pub mod telemetry;
