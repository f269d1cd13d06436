//! `stockroom diff`: compare the replica with the remote catalog.

use anyhow::Result;
use serde_json::Value;
use stockroom_catalog::{DiffSummary, Difference, RemoteCatalog};

use super::{compact, print_json, Output, Stores};

fn show(value: &Option<Value>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "<absent>".to_string(),
    }
}

/// Print the differences; returns how many records are out of sync.
pub fn run(
    stores: &Stores,
    remote: &dyn RemoteCatalog,
    output: Output,
    summary_only: bool,
) -> Result<usize> {
    let differences = stores.products.reconcile(remote)?;
    let summary = DiffSummary::of(&differences);

    match output {
        Output::Json if summary_only => print_json(&summary)?,
        Output::Json => print_json(&differences)?,
        Output::Table => {
            if !summary_only {
                for d in &differences {
                    print_difference(d);
                }
            }
            if summary.is_in_sync() {
                println!("In sync.");
            } else {
                println!(
                    "{} local-only, {} remote-only, {} modified.",
                    summary.local_only, summary.remote_only, summary.modified
                );
            }
        }
    }

    Ok(differences.len())
}

fn print_difference(d: &Difference) {
    let code = d.code().map(|c| c.to_string()).unwrap_or_default();
    match d {
        Difference::LocalOnly { local } => {
            println!("{:<12} {:>10}  {}", "local-only", code, compact(&local.fields));
        }
        Difference::RemoteOnly { remote } => {
            println!("{:<12} {:>10}  {}", "remote-only", code, compact(&remote.fields));
        }
        Difference::Modified { deltas, .. } => {
            println!("{:<12} {:>10}", "modified", code);
            for (field, delta) in deltas {
                println!(
                    "{:<12} {:>10}    {}: {} (local) vs {} (remote)",
                    "",
                    "",
                    field,
                    show(&delta.local),
                    show(&delta.remote)
                );
            }
        }
    }
}
