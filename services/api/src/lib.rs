mod cli;
mod infra;
mod routes;
mod server;

use childminder::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
