//! Isolate command implementation
//!
//! Runs the bootstrap sequence in this process and reports what changed. The
//! process exits right after, so nothing outside it is affected.

use anyhow::{Context, Result};
use serde::Serialize;
use toolbox_namespace::{
    remount_root_private, root_propagation, unshare_namespaces, NamespaceFlags, NamespaceIds,
    Propagation,
};

#[derive(Serialize)]
struct IsolationReport {
    namespaces: NamespaceFlags,
    before: NamespaceIds,
    after: NamespaceIds,
    isolated: bool,
    root_propagation: Option<Propagation>,
}

pub fn execute(namespaces: NamespaceFlags, json: bool) -> Result<()> {
    let before = NamespaceIds::current().context("Failed to read namespaces")?;

    tracing::info!(namespaces = %namespaces, "Isolating");

    unshare_namespaces(namespaces).context("Failed to unshare namespaces")?;

    // Only meaningful inside a fresh mount namespace
    let root_propagation = if namespaces.contains(NamespaceFlags::MOUNT) {
        remount_root_private().context("Failed to make / private")?;
        Some(root_propagation().context("Failed to read mount table")?)
    } else {
        None
    };

    let after = NamespaceIds::current().context("Failed to read namespaces")?;
    let report = IsolationReport {
        namespaces,
        isolated: after.differs_from(&before, namespaces),
        before,
        after,
        root_propagation,
    };

    if json {
        return super::print_json(&report);
    }

    println!("\n🔒 Isolation report ({namespaces})");
    println!("{:-<60}", "");
    print!("{}", report.after);
    if report.after.pid_namespace_pending() {
        println!("PID namespace: new, waiting for its first child");
    }
    if let Some(propagation) = report.root_propagation {
        println!("Root propagation: {propagation}");
    }
    if namespaces.is_empty() {
        println!("\n⚠️  No namespaces requested, nothing was isolated");
    } else if report.isolated {
        println!("\n✅ New namespaces in place");
    } else {
        println!("\n⚠️  Namespace identifiers did not change");
    }

    Ok(())
}
