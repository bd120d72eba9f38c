//! Propagation command implementation

use anyhow::{Context, Result};
use serde::Serialize;
use toolbox_namespace::{root_propagation, Propagation};

#[derive(Serialize)]
struct RootPropagation {
    mount_point: &'static str,
    propagation: Propagation,
}

pub fn execute(json: bool) -> Result<()> {
    let propagation = root_propagation().context("Failed to read mount table")?;

    if json {
        return super::print_json(&RootPropagation {
            mount_point: "/",
            propagation,
        });
    }

    println!("/: {propagation}");
    Ok(())
}
