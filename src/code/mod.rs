//! Rotating code source.
//!
//! There is exactly one current code at any time. It is replaced as a whole,
//! together with its expiry, so a reader can never observe a new value paired
//! with an old expiry or the other way around.

mod random;

pub use random::RandomCodeGenerator;

use std::time::SystemTime;

/// Snapshot of the current code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodeRecord {
    pub value: String,
    pub expires_at: SystemTime,
}

pub trait CodeGenerator: Send + Sync {
    /// Return the current code and the moment it stops being valid.
    fn generate(&self) -> CodeRecord;
}
