use crate::{api, engine::EngineConfig};
use anyhow::Result;
use tracing::info;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub config: EngineConfig,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    info!(
        port = args.port,
        max_failed_attempts = args.config.max_failed_attempts(),
        "starting server"
    );

    api::new(args.port, args.dsn, args.config).await
}
