//! # Dkron Testing Utils
//!
//! Shared testing helpers for the provider workspace.
//!
//! - **Mock server**: an in-process stand-in for the Dkron `/v1/jobs` API
//!   that records every request it receives
//! - **Builders**: attribute sets for the `dkron_job` resource with sensible
//!   defaults
//!
//! ## Usage
//!
//! ```toml
//! [dev-dependencies]
//! dkron-testing-utils = { path = "../testing-utils" }
//! ```

pub mod builders;
pub mod server;

pub use builders::*;
pub use server::*;
