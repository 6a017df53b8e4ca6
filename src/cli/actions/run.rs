use crate::cli::actions::{server, Action};
use anyhow::Result;

/// Map an [`Action`] onto its runner.
///
/// # Errors
///
/// Propagates the runner's error.
pub async fn execute(action: Action) -> Result<()> {
    match action {
        Action::Server(args) => server::execute(args).await,
    }
}
