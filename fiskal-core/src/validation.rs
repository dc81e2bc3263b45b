use thiserror::Error;

/// Field-level validation failure of a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bill has no security code; seal it before building a request")]
    MissingSecurityCode,
    #[error("missing required field: {0:?}")]
    MissingField(Field),
    #[error("malformed {field:?}: {reason}")]
    MalformedRecord { field: Field, reason: String },
}

impl ValidationError {
    pub(crate) fn malformed(field: Field, reason: impl Into<String>) -> Self {
        ValidationError::MalformedRecord {
            field,
            reason: reason.into(),
        }
    }
}

/// Record field a validation error refers to.
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TaxId,
    SequenceNumber,
    BusinessAreaCode,
    DeviceCode,
    TaxRate,
    Refund,
    SecurityCode,
    Street,
    HouseNumber,
    PostalCode,
    Settlement,
    Municipality,
    OtherPremisesType,
    WorkingHours,
    SpecificPurpose,
    ParagonNumber,
}

/// Reject empty or whitespace-only strings.
pub(crate) fn require_text(field: Field, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}
