mod cli;
mod infra;
mod render;
mod routes;
mod server;

use ffw_enrollment::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
