//! SPRT orchestrator for beatrijs
//!
//! This crate provides infrastructure for:
//! - Building the local engine and a reference build cloned from git
//! - Staging both binaries in a scratch workspace
//! - Running an SPRT match between them through cutechess-cli
//! - Recording what happened in a JSON run record
//!
//! # Usage
//!
//! ```bash
//! # Test the working tree against master with a 64 MB hash
//! cargo run -p sprt_runner --release -- --hash 64
//!
//! # Test against a feature branch without adjudication, printing the plan only
//! cargo run -p sprt_runner -- --branch dev --preset unadjudicated --dry-run
//! ```

mod config;
mod cutechess;
mod error;
mod executor;
mod host;
mod orchestrator;
mod plan;
mod report;

pub use config::*;
pub use cutechess::*;
pub use error::*;
pub use executor::*;
pub use host::*;
pub use orchestrator::*;
pub use plan::*;
pub use report::*;
