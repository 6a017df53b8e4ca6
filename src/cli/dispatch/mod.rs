//! Command-line argument dispatch and server initialization.
//!
//! This module takes validated CLI arguments and maps them to the
//! appropriate action, such as starting the API server with its policy
//! configuration.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::policy;
use anyhow::{Context, Result};
use url::Url;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    // Fail on an unparseable DSN here instead of at connect time.
    Url::parse(&dsn).with_context(|| format!("invalid database DSN: {dsn}"))?;

    let config = policy::engine_config(matches);

    Ok(Action::Server(Args { port, dsn, config }))
}
