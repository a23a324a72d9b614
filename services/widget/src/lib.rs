mod cli;
mod commands;
mod infra;

use report_widget::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
