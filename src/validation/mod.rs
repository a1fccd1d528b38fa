//! URL liveness checking
//!
//! This module turns unchecked matches into completed ones by issuing
//! a single HTTP GET per URL.

pub mod checker;

// Re-export commonly used items
pub use checker::{CheckLink, LivenessChecker};
