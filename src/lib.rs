// ABOUTME: Public library API for the ferry mirroring pipeline
// ABOUTME: Re-exports core modules for external use

pub mod auth;
pub mod cli;
pub mod config;
pub mod drive;
pub mod error;
pub mod fetch;
pub mod github;
pub mod sync;

pub use error::{Error, Result};
pub use sync::SyncOutcome;
