//! Toolbox Core - shared error types
//!
//! Every isolation and filesystem primitive in the toolbox workspace reports
//! failures through the [`Error`] type defined here.

#![warn(missing_docs, clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;

pub use error::{Error, Result};
