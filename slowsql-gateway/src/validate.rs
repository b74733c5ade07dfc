//! Batch validation.
//!
//! Records are checked in order and the first defect rejects the whole
//! batch. Record numbers in messages are 1-based.

use thiserror::Error;

use crate::models::ConnectionDescriptor;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid JSON array: batch is empty")]
    EmptyBatch,
    #[error("Missing required fields in record {0}")]
    MissingFields(usize),
    #[error("Invalid port number in record {0}")]
    InvalidPort(usize),
}

/// Validate every descriptor of a submitted batch.
pub fn validate_batch(batch: &[ConnectionDescriptor]) -> Result<(), ValidationError> {
    if batch.is_empty() {
        return Err(ValidationError::EmptyBatch);
    }

    for (i, record) in batch.iter().enumerate() {
        let n = i + 1;
        if is_blank(&record.url) || is_blank(&record.database) {
            return Err(ValidationError::MissingFields(n));
        }
        if record.port.as_port().is_none() {
            return Err(ValidationError::InvalidPort(n));
        }
    }

    Ok(())
}

fn is_blank(field: &Option<String>) -> bool {
    field.as_deref().map_or(true, str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn batch(v: Value) -> Vec<ConnectionDescriptor> {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn accepts_well_formed_batch() {
        let b = batch(json!([
            {"url": "10.0.0.1", "port": 3306, "database": "orders"},
            {"url": "10.0.0.2", "port": "3307", "database": "billing", "connectionUrl": "x"},
            {"url": "10.0.0.3", "port": 3308.0, "database": "audit"}
        ]));
        assert_eq!(validate_batch(&b), Ok(()));
    }

    #[test]
    fn empty_batch_rejected() {
        assert_eq!(validate_batch(&[]), Err(ValidationError::EmptyBatch));
    }

    #[test]
    fn empty_host_names_record() {
        let b = batch(json!([
            {"url": "10.0.0.1", "port": 3306, "database": "orders"},
            {"url": "", "port": 3306, "database": "orders"}
        ]));
        let err = validate_batch(&b).unwrap_err();
        assert_eq!(err, ValidationError::MissingFields(2));
        assert_eq!(err.to_string(), "Missing required fields in record 2");
    }

    #[test]
    fn missing_database_names_record() {
        let b = batch(json!([{"url": "10.0.0.1", "port": 3306}]));
        assert_eq!(validate_batch(&b), Err(ValidationError::MissingFields(1)));
    }

    #[test]
    fn invalid_port_names_record() {
        for port in [json!(0), json!(65536), json!(-1), json!("abc"), json!({"p": 1}), json!(null)] {
            let b = batch(json!([
                {"url": "h", "port": 3306, "database": "d"},
                {"url": "h", "port": 3306, "database": "d"},
                {"url": "h", "port": port, "database": "d"}
            ]));
            let err = validate_batch(&b).unwrap_err();
            assert_eq!(err.to_string(), "Invalid port number in record 3");
        }
    }

    #[test]
    fn stops_at_first_defect() {
        let b = batch(json!([
            {"url": "h", "port": 0, "database": "d"},
            {"url": "", "port": 3306, "database": "d"}
        ]));
        assert_eq!(validate_batch(&b), Err(ValidationError::InvalidPort(1)));
    }

    #[test]
    fn missing_fields_checked_before_port() {
        let b = batch(json!([{"url": "h", "port": 0, "database": ""}]));
        assert_eq!(validate_batch(&b), Err(ValidationError::MissingFields(1)));
    }
}
