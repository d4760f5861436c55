//! Sync command - one full pass over users, organizations and boards
//!
//! Prints either a summary or the whole snapshot as JSON. Ctrl-C cancels
//! the pass at its next network call.

use anyhow::{Result, bail};
use clap::Args;
use connector_core::{Connector, SyncDriver, SyncReport, SyncSnapshot};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use trello_connector::TrelloConnector;

use super::GlobalArgs;
use crate::output;

#[derive(Args)]
pub struct SyncArgs {
    /// Output the snapshot and report as JSON
    #[arg(long)]
    pub json: bool,

    /// List every grant identifier in the summary
    #[arg(long, short)]
    pub verbose: bool
}

#[derive(Serialize)]
struct SyncOutput<'a> {
    report: &'a SyncReport,
    snapshot: &'a SyncSnapshot
}

pub async fn run(global: &GlobalArgs, args: SyncArgs) -> Result<()> {
    let config = global.resolve_config()?;
    let connector = TrelloConnector::new(&config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling sync");
            on_signal.cancel();
        }
    });

    info!(
        organizations = ?config.organizations,
        connector = %connector.metadata().display_name,
        "Starting Trello sync"
    );
    let driver = SyncDriver::new(connector.resource_syncers());
    let (snapshot, report) = driver.run(&cancel).await;

    if args.json {
        output::json(&SyncOutput {
            report: &report,
            snapshot: &snapshot
        })?;
    } else {
        print_summary(&snapshot, &report, args.verbose);
    }

    if report.has_errors() {
        bail!("sync finished with {} failed resource type(s)", report.errors.len());
    }
    Ok(())
}

fn print_summary(snapshot: &SyncSnapshot, report: &SyncReport, verbose: bool) {
    output::header("Trello Sync");
    println!();

    for (resource_type, count) in &report.resources_by_type {
        output::tally(*count, resource_type);
    }
    output::tally(report.entitlements_synced, "entitlements");
    output::tally(report.grants_synced, "grants");
    if let Some(rate_limit) = &report.rate_limit {
        output::rate_limit(rate_limit);
    }

    if verbose && !snapshot.grants.is_empty() {
        println!();
        output::subheader("Grants");
        for grant in &snapshot.grants {
            println!("    {}", grant.external_id().unwrap_or(&grant.id));
        }
    }

    for failure in &report.errors {
        output::sync_failure(failure);
    }

    if report.has_errors() {
        output::hint("Set RUST_LOG=trello_connector=debug to trace the failing requests");
    } else {
        println!();
        output::success(&format!(
            "Synced {} resources",
            report.resources_synced()
        ));
    }
}
