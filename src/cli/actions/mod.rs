pub mod server;

// The match over variants lives in run.rs, not here.
mod run;

/// Everything the binary knows how to do.
#[derive(Debug)]
pub enum Action {
    Server(server::Args),
}

impl Action {
    /// Run the action to completion.
    ///
    /// # Errors
    ///
    /// Propagates whatever the underlying action reports.
    pub async fn execute(self) -> anyhow::Result<()> {
        run::execute(self).await
    }
}
