//! Build metadata.
//!
//! The version recorded here is stamped into every resolved configuration,
//! regardless of what any configuration source claims.

/// Version of this sonde build, taken from the crate manifest.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
