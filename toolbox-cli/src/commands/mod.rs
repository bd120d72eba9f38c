use crate::cli::Commands;
use anyhow::Result;

pub mod isolate;
pub mod namespaces;
pub mod propagation;
pub mod set_time_zero;

/// Dispatch command to appropriate handler
pub fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Namespaces { pid, json } => namespaces::execute(pid, json),

        Commands::Propagation { json } => propagation::execute(json),

        Commands::Isolate { namespaces, json } => isolate::execute(namespaces, json),

        Commands::SetTimeZero { recursive, paths } => set_time_zero::execute(recursive, &paths),
    }
}

/// Print a value as pretty JSON on stdout
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
