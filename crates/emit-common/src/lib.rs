#![doc = "Common types shared across the emit workspace."]

pub mod config;
pub mod error;

pub use config::*;
pub use error::*;
