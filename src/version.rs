//! autograde version information.
//!
//! Exposes the harness version as a single constant so the CLI banner and generated configuration headers agree
//! on the same value. The value comes from Cargo metadata (`CARGO_PKG_VERSION`) at compile time.

/// The autograde version string (for example, `0.1.0`).
pub const AUTOGRADE_VERSION: &str = env!("CARGO_PKG_VERSION");
