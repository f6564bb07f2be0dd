//! Validation Module
//!
//! This module checks submitted payloads before a record ID is allocated.

mod validator;
pub use validator::Validator;
