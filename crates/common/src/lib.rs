//! Common utilities and types shared across cbtopo crates.

pub mod error;

pub use error::{Error, Result};
