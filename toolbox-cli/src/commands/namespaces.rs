//! Namespaces command implementation

use anyhow::{Context, Result};
use toolbox_namespace::{Namespace, NamespaceIds};

pub fn execute(pid: Option<u32>, json: bool) -> Result<()> {
    let target_pid = pid.unwrap_or_else(std::process::id);

    let ns_info =
        NamespaceIds::for_pid(target_pid).context("Failed to get namespace information")?;

    if json {
        return super::print_json(&ns_info);
    }

    println!("\n🔒 Namespace Information for PID {target_pid}");
    println!("{:-<60}", "");
    print!("{ns_info}");

    // Reading PID 1 needs privilege on most hosts
    match NamespaceIds::for_pid(1) {
        Ok(init) if init.mnt.is_some() => {
            println!();
            for ns in Namespace::ALL {
                if ns_info.differs_from(&init, ns.flag()) {
                    println!("✅ Isolated {ns} namespace");
                } else {
                    println!("⚠️  Host {ns} namespace");
                }
            }
        }
        Ok(_) => println!("\n⚠️  Cannot read namespaces of PID 1"),
        Err(e) => println!("\n❌ Failed to check isolation: {e}"),
    }

    Ok(())
}
