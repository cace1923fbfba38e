//! Service layer between handlers and `hr_core`.

pub mod auth;
pub mod cookies;
