use crate::{config::ValidationConfig, NewRecord, ValidationError};
use tracing::debug;

pub struct Validator {
    max_name_len: usize,
}

impl Validator {
    pub fn new(config: &ValidationConfig) -> Self {
        Self {
            max_name_len: config.max_name_len,
        }
    }

    /// Validate a submitted record
    /// Returns Ok(()) if valid, Err(ValidationError) if invalid
    pub fn validate(&self, record: &NewRecord) -> Result<(), ValidationError> {
        let len = record.name.len();
        if len > self.max_name_len {
            debug!("Rejecting record with {}-byte name", len);
            return Err(ValidationError::NameTooLong {
                len,
                max: self.max_name_len,
            });
        }

        Ok(())
    }
}
