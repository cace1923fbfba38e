//! # hr_core
//!
//! Authentication and credential recovery for the HR suite: session tokens,
//! password hashing, and the OTP password-reset workflow.

pub mod auth;
pub mod clock;
pub mod migrate;
pub mod models;
pub mod notify;
pub mod store;
pub mod uuid;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
