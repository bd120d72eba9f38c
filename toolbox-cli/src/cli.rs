//! CLI argument definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use toolbox_namespace::NamespaceFlags;

#[derive(Parser)]
#[command(name = "toolbox")]
#[command(about = "Namespace isolation and reproducible-tree helpers", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show namespace information
    Namespaces {
        /// Process ID (default: current process)
        #[arg(short, long)]
        pid: Option<u32>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show the mount propagation of /
    Propagation {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Unshare namespaces and make / private, then report the result
    Isolate {
        /// Namespaces to unshare, comma separated (mount, pid)
        #[arg(long = "ns", default_value = "mount,pid")]
        namespaces: NamespaceFlags,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Set access and modification time to the epoch
    SetTimeZero {
        /// Descend into directories without following symlinks
        #[arg(short, long)]
        recursive: bool,

        /// Paths to reset
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}
