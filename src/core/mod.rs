/*!
 * Core Module
 * Fundamental simulator types, configuration and error handling
 */

pub mod config;
pub mod errors;
pub mod limits;
pub mod serde;
pub mod types;

// Re-export for convenience
pub use config::*;
pub use errors::*;
pub use types::*;
